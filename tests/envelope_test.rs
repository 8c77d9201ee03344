//! Integration tests for key derivation and envelope construction.
//!
//! Envelopes are opened here with `aes-gcm` directly, the way a receiving
//! client would, to check the wire format end to end.

use std::collections::HashSet;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use ntfy_e2e::{build_envelope, derive_key, EncryptionError, EnvelopeBuilder};

const HEADER: &str = "eyJhbGciOiJkaXIiLCJlbmMiOiJBMjU2R0NNIn0";

/// Opens a compact envelope, returning the plaintext.
fn open(envelope: &str, key: &[u8]) -> Result<String, aes_gcm::Error> {
    let parts: Vec<&str> = envelope.split('.').collect();
    assert_eq!(parts.len(), 5, "envelope must have five fields");

    let nonce = BASE64URL.decode(parts[2]).unwrap();
    let mut sealed = BASE64URL.decode(parts[3]).unwrap();
    sealed.extend(BASE64URL.decode(parts[4]).unwrap());

    let cipher = Aes256Gcm::new_from_slice(key).unwrap();
    let plaintext = cipher.decrypt(
        Nonce::from_slice(&nonce),
        Payload {
            msg: &sealed,
            aad: parts[0].as_bytes(),
        },
    )?;
    Ok(String::from_utf8(plaintext).unwrap())
}

/// Flips bit `bit` of the decoded field `index` and re-encodes it.
fn flip_bit(envelope: &str, index: usize, bit: usize) -> String {
    let mut parts: Vec<String> = envelope.split('.').map(String::from).collect();
    let mut bytes = BASE64URL.decode(&parts[index]).unwrap();
    bytes[bit / 8] ^= 1 << (bit % 8);
    parts[index] = BASE64URL.encode(bytes);
    parts.join(".")
}

#[test]
fn test_round_trip() {
    let key = derive_key(b"secr3t password", "https://ntfy.sh/mysecret").unwrap();
    let plaintext = r#"{"message":"Python says hi","tags":["secret"]}"#;

    let envelope = build_envelope(plaintext, key.as_ref()).unwrap();

    assert!(envelope.starts_with(&format!("{}..", HEADER)));
    assert_eq!(open(&envelope, key.as_ref()).unwrap(), plaintext);
}

#[test]
fn test_empty_plaintext_round_trip() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    let envelope = build_envelope("", key.as_ref()).unwrap();

    let parts: Vec<&str> = envelope.split('.').collect();
    assert_eq!(parts[3], "");
    assert_eq!(BASE64URL.decode(parts[4]).unwrap().len(), 16);
    assert_eq!(open(&envelope, key.as_ref()).unwrap(), "");
}

#[test]
fn test_tampered_ciphertext_rejected() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    let envelope = build_envelope("attack at dawn", key.as_ref()).unwrap();
    let last = "attack at dawn".len() * 8 - 1;

    for bit in [0, 7, 8, 63, last - 7, last] {
        assert!(
            open(&flip_bit(&envelope, 3, bit), key.as_ref()).is_err(),
            "ciphertext bit {} flip went undetected",
            bit
        );
    }
}

#[test]
fn test_tampered_tag_rejected() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    let envelope = build_envelope("attack at dawn", key.as_ref()).unwrap();

    for bit in 0..128 {
        assert!(
            open(&flip_bit(&envelope, 4, bit), key.as_ref()).is_err(),
            "tag bit {} flip went undetected",
            bit
        );
    }
}

#[test]
fn test_tampered_nonce_rejected() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    let envelope = build_envelope("attack at dawn", key.as_ref()).unwrap();

    for bit in [0, 50, 95] {
        assert!(open(&flip_bit(&envelope, 2, bit), key.as_ref()).is_err());
    }
}

#[test]
fn test_header_is_authenticated() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    let envelope = build_envelope("attack at dawn", key.as_ref()).unwrap();

    // Same JSON with different whitespace still changes the AAD.
    let other_header = BASE64URL.encode(r#"{"alg":"dir", "enc":"A256GCM"}"#);
    let swapped = envelope.replacen(HEADER, &other_header, 1);
    assert!(open(&swapped, key.as_ref()).is_err());
}

#[test]
fn test_other_topic_cannot_open() {
    let key = derive_key(b"pw", "https://ntfy.sh/alerts").unwrap();
    let other = derive_key(b"pw", "https://ntfy.sh/alerts2").unwrap();
    let envelope = build_envelope("hi", key.as_ref()).unwrap();

    assert!(open(&envelope, other.as_ref()).is_err());
}

#[test]
fn test_nonces_unique_over_many_envelopes() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    let builder = EnvelopeBuilder::new();

    let nonces: HashSet<String> = (0..1000)
        .map(|_| {
            let envelope = builder.build("same", key.as_ref()).unwrap();
            envelope.split('.').nth(2).unwrap().to_string()
        })
        .collect();

    assert_eq!(nonces.len(), 1000);
}

#[test]
fn test_envelopes_are_url_safe() {
    let key = derive_key(b"pw", "https://ntfy.sh/t").unwrap();
    for len in 0..64 {
        let envelope = build_envelope(&"x".repeat(len), key.as_ref()).unwrap();
        assert!(envelope
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }
}

#[test]
fn test_short_key_rejected() {
    let err = build_envelope("hi", &[0u8; 16]).unwrap_err();
    assert!(matches!(
        err,
        EncryptionError::InvalidKeyLength {
            expected: 32,
            actual: 16
        }
    ));
}
