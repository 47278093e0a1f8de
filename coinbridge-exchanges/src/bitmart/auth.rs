//! BitMart request signing.
//!
//! The signed payload is `timestamp#memo#body`, where `body` is the url
//! encoded query for GET requests and the JSON document for POST. The hex
//! HMAC-SHA256 of it goes in `X-BM-SIGN`.

use coinbridge_core::auth::{DigestFormat, HashAlgorithm, hmac_sign};
use coinbridge_core::credentials::SecretString;
use coinbridge_core::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

/// BitMart request signer.
#[derive(Debug, Clone)]
pub struct BitmartAuth {
    api_key: SecretString,
    secret: SecretString,
    memo: String,
}

impl BitmartAuth {
    /// Creates a signer.
    ///
    /// ```
    /// use coinbridge_exchanges::bitmart::BitmartAuth;
    ///
    /// let auth = BitmartAuth::new("your-api-key", "your-secret", "your-memo");
    /// assert_eq!(auth.api_key(), "your-api-key");
    /// ```
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        memo: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            secret: SecretString::new(secret),
            memo: memo.into(),
        }
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Hex signature of `timestamp#memo#payload`.
    pub fn sign(&self, timestamp: &str, payload: &str) -> Result<String> {
        let message = format!("{timestamp}#{}#{payload}", self.memo);
        hmac_sign(
            &message,
            self.secret.expose_secret(),
            HashAlgorithm::Sha256,
            DigestFormat::Hex,
        )
    }

    /// Headers for a signed request. `broker_id` is sent as
    /// `X-BM-BROKER-ID` when set.
    pub fn headers(
        &self,
        timestamp: &str,
        signature: &str,
        broker_id: Option<&str>,
    ) -> Result<HeaderMap> {
        let value = |name: &str, v: &str| {
            HeaderValue::from_str(v)
                .map_err(|e| Error::authentication(format!("invalid {name} header: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("X-BM-KEY", value("X-BM-KEY", self.api_key())?);
        headers.insert("X-BM-TIMESTAMP", value("X-BM-TIMESTAMP", timestamp)?);
        headers.insert("X-BM-SIGN", value("X-BM-SIGN", signature)?);
        if let Some(broker_id) = broker_id {
            headers.insert("X-BM-BROKER-ID", value("X-BM-BROKER-ID", broker_id)?);
        }
        Ok(headers)
    }
}
