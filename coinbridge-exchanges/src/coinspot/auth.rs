//! CoinSpot request signing.
//!
//! Private calls send the JSON body as-is and sign it: `sign` is the hex
//! HMAC-SHA512 of the body bytes, `key` is the API key.

use coinbridge_core::auth::{DigestFormat, HashAlgorithm, hmac_sign};
use coinbridge_core::credentials::SecretString;
use coinbridge_core::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

/// CoinSpot request signer.
#[derive(Debug, Clone)]
pub struct CoinspotAuth {
    api_key: SecretString,
    secret: SecretString,
}

impl CoinspotAuth {
    /// Creates a signer.
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            secret: SecretString::new(secret),
        }
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Hex HMAC-SHA512 of `body`.
    pub fn sign(&self, body: &str) -> Result<String> {
        hmac_sign(
            body,
            self.secret.expose_secret(),
            HashAlgorithm::Sha512,
            DigestFormat::Hex,
        )
    }

    /// Headers for a signed JSON body.
    pub fn headers(&self, body: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "key",
            HeaderValue::from_str(self.api_key())
                .map_err(|e| Error::authentication(format!("invalid api key header: {e}")))?,
        );
        headers.insert(
            "sign",
            HeaderValue::from_str(&self.sign(body)?)
                .map_err(|e| Error::authentication(format!("invalid signature header: {e}")))?,
        );
        Ok(headers)
    }
}
