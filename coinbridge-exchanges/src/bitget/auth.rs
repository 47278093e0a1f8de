//! Bitget API authentication.
//!
//! REST requests carry these headers:
//! - `ACCESS-KEY`: API key
//! - `ACCESS-SIGN`: base64 HMAC-SHA256 of `timestamp + METHOD + path + body`
//! - `ACCESS-TIMESTAMP`: milliseconds
//! - `ACCESS-PASSPHRASE`: API passphrase
//!
//! The stream login signs `seconds + "GET" + "/user/verify"` the same way.

use coinbridge_core::auth::{DigestFormat, HashAlgorithm, hmac_sign};
use coinbridge_core::credentials::SecretString;
use coinbridge_core::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};

/// Path signed by the stream login.
const WS_VERIFY_PATH: &str = "/user/verify";

/// Bitget request signer.
///
/// Credentials are zeroed from memory when dropped.
#[derive(Debug, Clone)]
pub struct BitgetAuth {
    api_key: SecretString,
    secret: SecretString,
    passphrase: SecretString,
}

impl BitgetAuth {
    /// Creates a signer.
    ///
    /// ```
    /// use coinbridge_exchanges::bitget::BitgetAuth;
    ///
    /// let auth = BitgetAuth::new("your-api-key", "your-secret", "your-passphrase");
    /// assert_eq!(auth.api_key(), "your-api-key");
    /// ```
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            secret: SecretString::new(secret),
            passphrase: SecretString::new(passphrase),
        }
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the passphrase.
    pub fn passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }

    /// Concatenates `timestamp + METHOD + path + body`.
    pub fn build_sign_string(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> String {
        format!("{}{}{}{}", timestamp, method.to_uppercase(), path, body)
    }

    /// Base64 HMAC-SHA256 of the sign string.
    ///
    /// ```
    /// use coinbridge_exchanges::bitget::BitgetAuth;
    ///
    /// let auth = BitgetAuth::new("api-key", "secret", "passphrase");
    /// let signature = auth
    ///     .sign("1234567890", "GET", "/api/v2/spot/account/assets", "")
    ///     .unwrap();
    /// assert!(!signature.is_empty());
    /// ```
    pub fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String> {
        let sign_string = self.build_sign_string(timestamp, method, path, body);
        hmac_sign(
            &sign_string,
            self.secret.expose_secret(),
            HashAlgorithm::Sha256,
            DigestFormat::Base64,
        )
    }

    /// Adds the `ACCESS-*` headers, `Content-Type` and `locale`.
    pub fn add_auth_headers(
        &self,
        headers: &mut HeaderMap,
        timestamp: &str,
        signature: &str,
    ) -> Result<()> {
        let value = |v: &str| {
            HeaderValue::from_str(v)
                .map_err(|e| Error::invalid_request(format!("invalid header value: {e}")))
        };
        headers.insert("ACCESS-KEY", value(self.api_key())?);
        headers.insert("ACCESS-SIGN", value(signature)?);
        headers.insert("ACCESS-TIMESTAMP", value(timestamp)?);
        headers.insert("ACCESS-PASSPHRASE", value(self.passphrase())?);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("locale", HeaderValue::from_static("en-US"));
        Ok(())
    }

    /// Signature for the stream login at `timestamp` (seconds).
    pub fn ws_sign(&self, timestamp: &str) -> Result<String> {
        self.sign(timestamp, "GET", WS_VERIFY_PATH, "")
    }

    /// `{"op":"login","args":[...]}` frame for `timestamp` (seconds).
    pub fn ws_login_frame(&self, timestamp: &str) -> Result<Value> {
        let sign = self.ws_sign(timestamp)?;
        Ok(json!({
            "op": "login",
            "args": [{
                "apiKey": self.api_key(),
                "passphrase": self.passphrase(),
                "timestamp": timestamp,
                "sign": sign,
            }],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbridge_core::auth::{base64_encode, hmac_sha256};

    fn auth() -> BitgetAuth {
        BitgetAuth::new("test-api-key", "test-secret", "test-passphrase")
    }

    #[test]
    fn test_build_sign_string() {
        let s = auth().build_sign_string("1700000000000", "post", "/api/v2/spot/trade/place-order", "{}");
        assert_eq!(s, "1700000000000POST/api/v2/spot/trade/place-order{}");
    }

    #[test]
    fn test_sign_matches_raw_hmac() {
        let a = auth();
        let signature = a.sign("1", "GET", "/path", "").unwrap();
        let expected = base64_encode(&hmac_sha256(b"1GET/path", b"test-secret").unwrap());
        assert_eq!(signature, expected);
    }

    #[test]
    fn test_sign_is_deterministic() {
        let a = auth();
        assert_eq!(
            a.sign("1", "GET", "/p", "").unwrap(),
            a.sign("1", "GET", "/p", "").unwrap()
        );
        assert_ne!(
            a.sign("1", "GET", "/p", "").unwrap(),
            a.sign("2", "GET", "/p", "").unwrap()
        );
    }

    #[test]
    fn test_add_auth_headers() {
        let a = auth();
        let mut headers = HeaderMap::new();
        a.add_auth_headers(&mut headers, "1700000000000", "sig").unwrap();
        assert_eq!(headers.get("ACCESS-KEY").unwrap(), "test-api-key");
        assert_eq!(headers.get("ACCESS-SIGN").unwrap(), "sig");
        assert_eq!(headers.get("ACCESS-TIMESTAMP").unwrap(), "1700000000000");
        assert_eq!(headers.get("ACCESS-PASSPHRASE").unwrap(), "test-passphrase");
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn test_ws_login_frame() {
        let a = auth();
        let frame = a.ws_login_frame("1700000000").unwrap();
        assert_eq!(frame["op"], "login");
        let arg = &frame["args"][0];
        assert_eq!(arg["apiKey"], "test-api-key");
        assert_eq!(arg["passphrase"], "test-passphrase");
        assert_eq!(arg["timestamp"], "1700000000");
        let expected = base64_encode(&hmac_sha256(b"1700000000GET/user/verify", b"test-secret").unwrap());
        assert_eq!(arg["sign"], expected);
    }
}
