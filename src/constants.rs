//! Crate-wide constants.

use std::time::Duration;

/// Timeout for publish and poll requests.
///
/// Streaming subscriptions are exempt: they stay open indefinitely and
/// only use [`CONNECT_TIMEOUT`].
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP/TLS connect timeout, also applied to streaming subscriptions.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cap on how much of an error response body is kept for the error message.
pub const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Config directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "ntfy-e2e";
