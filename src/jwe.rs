//! Compact JWE envelopes with direct key agreement.
//!
//! Produces the five-part compact serialization used for encrypted ntfy
//! messages (`Encryption: jwe`):
//!
//! ```text
//! BASE64URL(header) . "" . BASE64URL(iv) . BASE64URL(ciphertext) . BASE64URL(tag)
//! ```
//!
//! The header is always `{"alg":"dir","enc":"A256GCM"}`. The second part is
//! empty because the content key *is* the derived key (`alg=dir`); there is
//! no wrapped per-message key. The AAD fed to AES-GCM is the ASCII of the
//! encoded header, not the raw header JSON. All parts are base64url without
//! padding.
//!
//! The nonce comes from a [`NonceSource`]. Production code uses the OS
//! CSPRNG ([`OsNonceSource`]); a nonce must never repeat under one key.

use std::fmt;

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use rand::{rngs::OsRng, TryRngCore};

use crate::error::{EncryptionError, NonceError};

/// AES-GCM IV size (96 bits).
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size (128 bits).
pub const TAG_SIZE: usize = 16;

/// Supported content encryption.
///
/// Only one construction exists today. New ones get a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncryption {
    /// AES-256-GCM with the derived key used directly (`alg=dir`, `enc=A256GCM`).
    #[default]
    A256GcmDirect,
}

impl ContentEncryption {
    /// JOSE `alg` header value.
    pub fn alg(self) -> &'static str {
        match self {
            Self::A256GcmDirect => "dir",
        }
    }

    /// JOSE `enc` header value.
    pub fn enc(self) -> &'static str {
        match self {
            Self::A256GcmDirect => "A256GCM",
        }
    }

    /// Required key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::A256GcmDirect => 32,
        }
    }

    /// Protected header JSON, byte for byte as peers expect it.
    pub fn header_json(self) -> &'static str {
        match self {
            Self::A256GcmDirect => r#"{"alg":"dir","enc":"A256GCM"}"#,
        }
    }

    /// Base64url (unpadded) protected header. Also the AAD.
    pub fn encoded_header(self) -> String {
        BASE64URL.encode(self.header_json())
    }
}

/// Source of per-message nonces.
///
/// Implementations must be safe to share between threads and must never
/// hand out the same bytes twice for one key.
pub trait NonceSource: Send + Sync {
    /// Fill `buf` with fresh random bytes, returning how many were written.
    fn fill(&self, buf: &mut [u8]) -> Result<usize, NonceError>;
}

/// Nonces from the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn fill(&self, buf: &mut [u8]) -> Result<usize, NonceError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| NonceError(e.to_string()))?;
        Ok(buf.len())
    }
}

/// Decoded parts of one compact envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Encoded protected header (also the AAD).
    pub header: String,
    /// AES-GCM IV.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// Authentication tag.
    pub tag: [u8; TAG_SIZE],
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("header", &self.header)
            .field("nonce", &BASE64URL.encode(self.nonce))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// Compact serialization: `header..iv.ciphertext.tag`.
impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}.{}.{}",
            self.header,
            BASE64URL.encode(self.nonce),
            BASE64URL.encode(&self.ciphertext),
            BASE64URL.encode(self.tag)
        )
    }
}

/// Builds encrypted envelopes for one content encryption and nonce source.
#[derive(Debug)]
pub struct EnvelopeBuilder<N = OsNonceSource> {
    encryption: ContentEncryption,
    nonce_source: N,
}

impl EnvelopeBuilder {
    /// Builder using AES-256-GCM and the OS CSPRNG.
    pub fn new() -> Self {
        Self::with_nonce_source(OsNonceSource)
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NonceSource> EnvelopeBuilder<N> {
    /// Builder drawing nonces from `nonce_source`.
    pub fn with_nonce_source(nonce_source: N) -> Self {
        Self {
            encryption: ContentEncryption::default(),
            nonce_source,
        }
    }

    /// Content encryption this builder produces.
    pub fn encryption(&self) -> ContentEncryption {
        self.encryption
    }

    /// Encrypt `plaintext` under `key` and return the envelope parts.
    pub fn seal(&self, plaintext: &str, key: &[u8]) -> Result<Envelope, EncryptionError> {
        let expected = self.encryption.key_len();
        if key.len() != expected {
            return Err(EncryptionError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }

        let header = self.encryption.encoded_header();

        let mut nonce = [0u8; NONCE_SIZE];
        let filled = self.nonce_source.fill(&mut nonce)?;
        if filled < NONCE_SIZE {
            return Err(EncryptionError::ShortNonce {
                expected: NONCE_SIZE,
                actual: filled,
            });
        }

        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|e| EncryptionError::Cipher(e.to_string()))?;

        let mut ciphertext = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), header.as_bytes(), &mut ciphertext)
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(&tag);

        Ok(Envelope {
            header,
            nonce,
            ciphertext,
            tag: tag_bytes,
        })
    }

    /// Encrypt `plaintext` under `key` into the compact serialization.
    pub fn build(&self, plaintext: &str, key: &[u8]) -> Result<String, EncryptionError> {
        self.seal(plaintext, key).map(|envelope| envelope.to_string())
    }
}

/// Encrypt `plaintext` under `key` with a fresh OS-random nonce.
pub fn build_envelope(plaintext: &str, key: &[u8]) -> Result<String, EncryptionError> {
    EnvelopeBuilder::new().build(plaintext, key)
}
