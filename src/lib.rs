//! ntfy-e2e - end-to-end encrypted publishing to ntfy topics.
//!
//! A message is encrypted under a key derived from a shared password and the
//! topic URL, wrapped into a compact JWE envelope (`dir` + `A256GCM`) and
//! POSTed with `Encryption: jwe`. The server only stores and forwards the
//! envelope.
//!
//! # Modules
//!
//! - [`kdf`] - PBKDF2 key derivation from password and topic
//! - [`jwe`] - compact envelope construction
//! - [`topic`] - topic URL expansion
//! - [`message`] - wire message types and publish options
//! - [`client`] - blocking HTTP client (publish, trigger, subscribe, poll)
//! - [`config`] - configuration loading/saving
//! - [`commands`] - CLI subcommands
//!
//! # Example
//!
//! ```no_run
//! use ntfy_e2e::{derive_key, build_envelope};
//!
//! let key = derive_key(b"secr3t password", "https://ntfy.sh/mysecret")?;
//! let envelope = build_envelope(r#"{"message":"hi"}"#, key.as_ref())?;
//! assert_eq!(envelope.split('.').count(), 5);
//! # Ok::<(), ntfy_e2e::Error>(())
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod jwe;
pub mod kdf;
pub mod message;
pub mod topic;

// Re-export commonly used types
pub use client::{Auth, NtfyClient, Subscription};
pub use config::Config;
pub use error::{DerivationError, EncryptionError, Error, NonceError, Result};
pub use jwe::{build_envelope, ContentEncryption, Envelope, EnvelopeBuilder, NonceSource, OsNonceSource};
pub use kdf::{derive_key, DerivedKey};
pub use message::{Event, Message, MessagePayload, Priority, PublishOptions, SubscribeOptions};
pub use topic::expand_topic_url;
