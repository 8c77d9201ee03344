//! Topic key derivation.
//!
//! A publisher and a subscriber who share a password agree on a key for a
//! topic without exchanging anything else:
//!
//! ```text
//! salt = SHA-256(topic_url)
//! key  = PBKDF2-HMAC-SHA-256(password, salt, 50 000 rounds, 32 bytes)
//! ```
//!
//! # Known weakness
//!
//! The salt is derived from the topic URL, which is public. Every party
//! that guesses the topic can precompute against it, so the confidentiality
//! of a topic rests entirely on the strength of the password. An empty
//! password or topic is accepted and yields a weak but deterministic key.
//! Both properties are part of the protocol; peers deriving the same key
//! depend on them staying exactly as they are.

use hmac::Hmac;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::DerivationError;

/// PBKDF2 round count. Fixed: changing it changes every derived key.
pub const PBKDF2_ITERATIONS: u32 = 50_000;

/// Derived key size (AES-256).
pub const KEY_SIZE: usize = 32;

/// Salt size (SHA-256 output).
pub const SALT_SIZE: usize = 32;

/// Symmetric key derived from a password and a topic.
///
/// Wiped from memory on drop. `Debug` never prints the key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for DerivedKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Salt for a topic: the SHA-256 digest of its UTF-8 bytes.
pub fn topic_salt(topic: &str) -> [u8; SALT_SIZE] {
    Sha256::digest(topic.as_bytes()).into()
}

/// Derive the topic key for `password`.
///
/// `topic` must be spelled exactly as the other side spells it, normally
/// the fully expanded topic URL (see [`crate::topic::expand_topic_url`]).
pub fn derive_key(password: &[u8], topic: &str) -> Result<DerivedKey, DerivationError> {
    let salt = topic_salt(topic);
    let mut key = [0u8; KEY_SIZE];

    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, &salt, PBKDF2_ITERATIONS, &mut key)
        .map_err(|e| DerivationError::Prf(e.to_string()))?;

    let derived = DerivedKey(key);
    key.zeroize();
    Ok(derived)
}
