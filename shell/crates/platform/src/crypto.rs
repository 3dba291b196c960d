//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid HMAC key length")]
    InvalidKeyLength,

    #[error("Invalid base64url input: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a random 256-bit signing secret
pub fn random_secret() -> [u8; 32] {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// Encode bytes as unpadded base64url (JWT segment alphabet)
pub fn to_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url
pub fn from_base64url(s: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(general_purpose::URL_SAFE_NO_PAD.decode(s)?)
}

/// Compute HMAC-SHA256
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Verify an HMAC-SHA256 tag in constant time
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
        assert_ne!(random_secret(), random_secret());
    }

    #[test]
    fn test_base64url_has_no_padding_or_unsafe_chars() {
        let encoded = to_base64url(b"\xfb\xff\xfe hello");
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(from_base64url(&encoded).unwrap(), b"\xfb\xff\xfe hello");
    }

    #[test]
    fn test_base64url_rejects_garbage() {
        assert!(from_base64url("***").is_err());
    }

    #[test]
    fn test_hmac_sign_and_verify() {
        let key = [42u8; 32];
        let tag = hmac_sha256(&key, b"payload").unwrap();
        assert_eq!(tag, hmac_sha256(&key, b"payload").unwrap());
        assert!(verify_hmac_sha256(&key, b"payload", &tag));
        assert!(!verify_hmac_sha256(&key, b"tampered", &tag));
        assert!(!verify_hmac_sha256(&[43u8; 32], b"payload", &tag));
    }
}
