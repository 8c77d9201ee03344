//! Configuration loading and persistence.
//!
//! Settings come from `config.json` in the config directory, then from
//! environment variables. The password, access token and user credentials
//! are never written to disk; they only come from the environment (or the
//! command line).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::constants;
use crate::topic::DEFAULT_HOST;

/// Configuration for the ntfy-e2e CLI.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Host used to expand bare topic names.
    pub default_host: String,
    /// Shared password for encrypted publishing - NOT serialized.
    #[serde(skip)]
    pub password: Option<String>,
    /// Access token sent as a bearer token - NOT serialized.
    #[serde(skip)]
    pub token: Option<String>,
    /// `username[:password]` for basic auth - NOT serialized.
    #[serde(skip)]
    pub user: Option<String>,
    /// Publish/poll request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_host: DEFAULT_HOST.to_string(),
            password: None,
            token: None,
            user: None,
            timeout_secs: constants::HTTP_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("default_host", &self.default_host)
            .field("has_password", &self.password.is_some())
            .field("has_token", &self.token.is_some())
            .field("user", &self.user.as_deref().map(|u| u.split(':').next().unwrap_or(u)))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Returns the configuration directory path.
    ///
    /// `NTFY_CONFIG_DIR` overrides the platform config directory
    /// (Linux: `~/.config/ntfy-e2e`).
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("NTFY_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join(constants::CONFIG_DIR_NAME))
    }

    /// Path of the config file.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(constants::CONFIG_FILE_NAME))
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads a config file without applying environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `NTFY_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("NTFY_DEFAULT_HOST") {
            self.default_host = host;
        }

        if let Some(password) = lookup("NTFY_PASSWORD") {
            self.password = Some(password);
        }

        if let Some(token) = lookup("NTFY_TOKEN") {
            self.token = Some(token);
        }

        if let Some(user) = lookup("NTFY_USER") {
            self.user = Some(user);
        }

        if let Some(timeout) = lookup("NTFY_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => log::warn!("Ignoring invalid NTFY_TIMEOUT '{}'", timeout),
            }
        }
    }

    /// Persists the current configuration to `path`.
    /// Note: password, token and user are NOT saved.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// Persists the current configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Sets a persisted key from its string form.
    ///
    /// Secrets are rejected: they only come from the environment.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default_host" => self.default_host = value.trim_end_matches('/').to_string(),
            "timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs '{}'", value))?;
                if secs == 0 {
                    anyhow::bail!("timeout_secs must be > 0");
                }
                self.timeout_secs = secs;
            }
            "password" | "token" | "user" => anyhow::bail!(
                "'{}' is not stored on disk; set NTFY_{} instead",
                key,
                key.to_uppercase()
            ),
            _ => anyhow::bail!("Unknown config key '{}'", key),
        }
        Ok(())
    }

    /// Publish/poll request timeout. A zero from a hand-edited file means
    /// the default.
    pub fn request_timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => constants::HTTP_REQUEST_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_host, "https://ntfy.sh");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.password.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_config_serialization_excludes_secrets() {
        let mut config = Config::default();
        config.password = Some("secr3t password".to_string());
        config.token = Some("tk_abc".to_string());
        let json = serde_json::to_string(&config).unwrap();

        assert!(!json.contains("secr3t"));
        assert!(!json.contains("tk_abc"));
        assert!(!json.contains("password"));
        assert!(!json.contains("token"));
    }

    #[test]
    fn test_debug_excludes_secrets() {
        let mut config = Config::default();
        config.password = Some("secr3t password".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secr3t"));
        assert!(debug.contains("has_password: true"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("NTFY_DEFAULT_HOST", "https://ntfy.example.com"),
            ("NTFY_PASSWORD", "hunter2"),
            ("NTFY_TOKEN", "tk_123"),
            ("NTFY_TIMEOUT", "30"),
            ("NTFY_USER", "phil:mypass"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.default_host, "https://ntfy.example.com");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.token.as_deref(), Some("tk_123"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.user.as_deref(), Some("phil:mypass"));

        let debug = format!("{:?}", config);
        assert!(debug.contains("\"phil\""));
        assert!(!debug.contains("mypass"));
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "NTFY_TIMEOUT").then(|| "soon".to_string()));
        assert_eq!(config.timeout_secs, 10);

        config.apply_overrides(|k| (k == "NTFY_TIMEOUT").then(|| "0".to_string()));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_zero_timeout_in_file_uses_default() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), constants::HTTP_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_set_keys() {
        let mut config = Config::default();
        config.set("default_host", "https://ntfy.example.com/").unwrap();
        config.set("timeout_secs", "3").unwrap();
        assert_eq!(config.default_host, "https://ntfy.example.com");
        assert_eq!(config.timeout_secs, 3);

        assert!(config.set("timeout_secs", "-1").is_err());
        let err = config.set("timeout_secs", "0").unwrap_err();
        assert!(err.to_string().contains("must be > 0"));
        assert_eq!(config.timeout_secs, 3);
        assert!(config.set("password", "x").is_err());
        assert!(config.set("user", "phil:pw").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert!(config.password.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.default_host = "https://push.example.org".to_string();
        config.timeout_secs = 5;
        config.password = Some("not persisted".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.default_host, "https://push.example.org");
        assert_eq!(loaded.timeout_secs, 5);
        assert!(loaded.password.is_none());

        #[cfg(unix)]
        {
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"default_host": "https://ntfy.lan"}"#).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.default_host, "https://ntfy.lan");
        assert_eq!(loaded.timeout_secs, 10);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
