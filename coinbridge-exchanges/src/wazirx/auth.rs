//! WazirX request signing.
//!
//! The signed payload is the key-sorted, url-encoded parameter string
//! (including `recvWindow` and `timestamp`). The hex HMAC-SHA256 of it is
//! appended as `&signature=`, and the key travels in `X-Api-Key`.

use coinbridge_core::auth::{DigestFormat, HashAlgorithm, hmac_sign, keysort_urlencode};
use coinbridge_core::credentials::SecretString;
use coinbridge_core::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::BTreeMap;

/// WazirX request signer.
#[derive(Debug, Clone)]
pub struct WazirxAuth {
    api_key: SecretString,
    secret: SecretString,
}

impl WazirxAuth {
    /// Creates a signer.
    ///
    /// ```
    /// use coinbridge_exchanges::wazirx::WazirxAuth;
    ///
    /// let auth = WazirxAuth::new("your-api-key", "your-secret");
    /// assert_eq!(auth.api_key(), "your-api-key");
    /// ```
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

    /// Adds `recvWindow` and `timestamp`, then returns
    /// `query&signature=...`.
    pub fn signed_query(
        &self,
        mut params: BTreeMap<String, String>,
        recv_window: u64,
        timestamp: i64,
    ) -> Result<String> {
        params.insert("recvWindow".into(), recv_window.to_string());
        params.insert("timestamp".into(), timestamp.to_string());
        let query = keysort_urlencode(&params);
        let signature = hmac_sign(
            &query,
            self.secret.expose_secret(),
            HashAlgorithm::Sha256,
            DigestFormat::Hex,
        )?;
        Ok(format!("{query}&signature={signature}"))
    }

    /// Headers for a signed request.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(
            "X-Api-Key",
            HeaderValue::from_str(self.api_key())
                .map_err(|e| Error::authentication(format!("invalid api key header: {e}")))?,
        );
        Ok(headers)
    }
}
