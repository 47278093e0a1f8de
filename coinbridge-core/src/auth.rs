//! Request signing primitives.
//!
//! Exchanges sign private requests with an HMAC over some canonical form
//! of the request. The adapters build that canonical string; this module
//! computes the digest and encodes it the way each exchange expects.
//!
//! ```rust
//! use coinbridge_core::auth::{DigestFormat, HashAlgorithm, hmac_sign};
//!
//! let sig = hmac_sign("payload", "secret", HashAlgorithm::Sha256, DigestFormat::Hex).unwrap();
//! assert_eq!(sig.len(), 64);
//! ```

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use std::collections::BTreeMap;
use std::fmt;

/// Digest used inside the HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// SHA-256 (Bitget, WazirX).
    Sha256,
    /// SHA-512 (CoinSpot).
    Sha512,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => f.write_str("sha256"),
            HashAlgorithm::Sha512 => f.write_str("sha512"),
        }
    }
}

/// Text encoding of the signature bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestFormat {
    /// Lowercase hexadecimal.
    Hex,
    /// Standard base64 with padding.
    Base64,
}

/// Computes `HMAC(secret, message)` and encodes it.
pub fn hmac_sign(
    message: &str,
    secret: &str,
    algorithm: HashAlgorithm,
    digest: DigestFormat,
) -> Result<String> {
    let bytes = match algorithm {
        HashAlgorithm::Sha256 => hmac_sha256(message.as_bytes(), secret.as_bytes())?,
        HashAlgorithm::Sha512 => hmac_sha512(message.as_bytes(), secret.as_bytes())?,
    };
    Ok(encode_bytes(&bytes, digest))
}

/// Raw HMAC-SHA256.
pub fn hmac_sha256(data: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| Error::authentication(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Raw HMAC-SHA512.
pub fn hmac_sha512(data: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret)
        .map_err(|e| Error::authentication(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Encodes bytes as hex or base64.
pub fn encode_bytes(bytes: &[u8], digest: DigestFormat) -> String {
    match digest {
        DigestFormat::Hex => hex::encode(bytes),
        DigestFormat::Base64 => general_purpose::STANDARD.encode(bytes),
    }
}

/// Lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    encode_bytes(bytes, DigestFormat::Hex)
}

/// Standard padded base64.
pub fn base64_encode(bytes: &[u8]) -> String {
    encode_bytes(bytes, DigestFormat::Base64)
}

/// Percent-encodes `key=value` pairs joined with `&`, sorted by key.
pub fn keysort_urlencode(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
