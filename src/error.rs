//! Error types for key derivation, envelope construction and transport.
//!
//! The crypto errors are fatal for the message at hand. Nothing in this
//! crate retries; a caller that retries a publish must build a fresh
//! envelope (and therefore draw a fresh nonce) for every attempt.

use thiserror::Error;

/// Key derivation failed.
#[derive(Debug, Error)]
pub enum DerivationError {
    /// The PBKDF2 pseudo-random function rejected the password as a key.
    #[error("Key derivation failed: {0}")]
    Prf(String),
}

/// Failure to produce the random nonce for one envelope.
#[derive(Debug, Error)]
#[error("Nonce source failed: {0}")]
pub struct NonceError(pub String);

/// Envelope construction failed. No partial envelope is ever returned.
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// Key is not the length the content encryption requires.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required key length in bytes.
        expected: usize,
        /// Length of the key that was supplied.
        actual: usize,
    },

    /// The nonce source reported an error.
    #[error(transparent)]
    NonceUnavailable(#[from] NonceError),

    /// The nonce source produced fewer bytes than the cipher needs.
    #[error("Short nonce: expected {expected} random bytes, got {actual}")]
    ShortNonce {
        /// Required nonce length in bytes.
        expected: usize,
        /// Bytes the source actually filled.
        actual: usize,
    },

    /// The AEAD cipher refused to encrypt.
    #[error("Encryption failed: {0}")]
    Cipher(String),
}

/// Errors surfaced by [`crate::client::NtfyClient`].
#[derive(Debug, Error)]
pub enum Error {
    /// Deriving the topic key failed.
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// Building the encrypted envelope failed.
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    /// Request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, trimmed.
        body: String,
    },

    /// Server reply or stream line was not valid message JSON.
    #[error("Invalid message JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the subscription stream failed.
    #[error("Stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
