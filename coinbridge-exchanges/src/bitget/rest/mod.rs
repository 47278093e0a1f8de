//! Bitget REST API implementation.
//!
//! Requests go to the v2 API. Coded failures in the `{code, msg, data}`
//! envelope are mapped by the client's error hook, so callers only see
//! successful payloads.

mod account;
mod market_data;
mod trading;

use super::{Bitget, BitgetAuth};
use coinbridge_core::auth::keysort_urlencode;
use coinbridge_core::{Error, Result};
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Query parameters, sorted so signatures are reproducible.
pub(crate) type Params = BTreeMap<String, String>;

/// The `data` member of a response envelope.
pub(crate) fn response_data(response: &Value) -> Result<&Value> {
    response.get("data").ok_or_else(|| Error::missing_field("data"))
}

/// The `data` member, required to be an array.
pub(crate) fn response_array(response: &Value) -> Result<&Vec<Value>> {
    response_data(response)?
        .as_array()
        .ok_or_else(|| Error::invalid_value("data", "expected an array"))
}

impl Bitget {
    /// Signer built from the configured credentials.
    pub fn get_auth(&self) -> Result<BitgetAuth> {
        self.check_required_credentials()?;
        let config = &self.base().config;
        match (&config.api_key, &config.secret, &config.password) {
            (Some(key), Some(secret), Some(passphrase)) => Ok(BitgetAuth::new(
                key.expose_secret(),
                secret.expose_secret(),
                passphrase.expose_secret(),
            )),
            _ => Err(Error::authentication("bitget requires apiKey, secret and password")),
        }
    }

    /// Fails unless api key, secret and passphrase are all set.
    pub fn check_required_credentials(&self) -> Result<()> {
        self.base().check_required_credentials(true)
    }

    /// Unauthenticated GET.
    pub(crate) async fn public_get(&self, path: &str, params: &Params) -> Result<Value> {
        let mut url = format!("{}{}", self.urls().rest, path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&keysort_urlencode(params));
        }
        debug!(url = %url, "Bitget public request");
        self.base().http_client.get(&url, None).await
    }

    /// Signed request. GET parameters go in the query string; POST
    /// parameters are sent as the JSON body.
    pub(crate) async fn private_request(
        &self,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<Value> {
        let auth = self.get_auth()?;
        let timestamp = self.base().nonce().to_string();

        let (request_path, body) = if method == Method::GET {
            if params.is_empty() {
                (path.to_string(), None)
            } else {
                (format!("{path}?{}", keysort_urlencode(params)), None)
            }
        } else {
            let body: serde_json::Map<String, Value> = params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            (path.to_string(), Some(Value::Object(body)))
        };

        let body_string = body.as_ref().map(Value::to_string).unwrap_or_default();
        let signature = auth.sign(&timestamp, method.as_str(), &request_path, &body_string)?;
        let mut headers = HeaderMap::new();
        auth.add_auth_headers(&mut headers, &timestamp, &signature)?;

        let url = format!("{}{}", self.urls().rest, request_path);
        debug!(method = %method, url = %url, "Bitget private request");

        let client = &self.base().http_client;
        match method {
            Method::GET => client.get(&url, Some(headers)).await,
            Method::POST => client.post_raw(&url, Some(headers), body_string).await,
            other => Err(Error::invalid_request(format!(
                "Unsupported HTTP method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_sorted_and_encoded() {
        let mut params = Params::new();
        params.insert("symbol".into(), "BTCUSDT".into());
        params.insert("limit".into(), "100".into());
        params.insert("clientOid".into(), "a b".into());
        assert_eq!(keysort_urlencode(&params), "clientOid=a%20b&limit=100&symbol=BTCUSDT");
    }

    #[test]
    fn test_response_data() {
        let response = serde_json::json!({"code": "00000", "data": [1, 2]});
        assert_eq!(response_array(&response).unwrap().len(), 2);
        assert!(response_data(&serde_json::json!({"code": "00000"})).is_err());
        assert!(response_array(&serde_json::json!({"data": {}})).is_err());
    }

    #[test]
    fn test_get_auth_requires_passphrase() {
        let bitget = Bitget::builder().api_key("k").secret("s").build().unwrap();
        let err = bitget.get_auth().unwrap_err();
        assert!(err.as_authentication().is_some());

        let bitget = Bitget::builder()
            .api_key("k")
            .secret("s")
            .passphrase("p")
            .build()
            .unwrap();
        assert_eq!(bitget.get_auth().unwrap().passphrase(), "p");
    }
}
