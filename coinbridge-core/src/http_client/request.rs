use crate::error::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::builder::HttpClient;

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(Value),
    /// Pre-encoded `application/x-www-form-urlencoded` string.
    Form(String),
    /// Sent verbatim; the caller sets `Content-Type`.
    Raw(String),
}

impl RequestBody {
    fn into_parts(self) -> Result<(String, Option<&'static str>)> {
        match self {
            Self::Json(value) => serde_json::to_string(&value)
                .map(|s| (s, Some("application/json")))
                .map_err(|e| Error::invalid_request(format!("JSON serialization failed: {e}"))),
            Self::Form(s) => Ok((s, Some("application/x-www-form-urlencoded"))),
            Self::Raw(s) => Ok((s, None)),
        }
    }
}

impl HttpClient {
    /// Sends a request, retrying transient failures, all within the
    /// configured total timeout.
    ///
    /// # Errors
    ///
    /// Timeout, transport failures that exhausted retries, vendor errors
    /// from the installed hook, and non-success statuses.
    #[instrument(
        name = "http_fetch",
        skip(self, headers, body),
        fields(method = %method, url = %url)
    )]
    pub async fn fetch(
        &self,
        url: &str,
        method: Method,
        headers: Option<HeaderMap>,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        if self.config().enable_rate_limit {
            if let Some(limiter) = self.rate_limiter() {
                limiter.wait().await;
            }
        }

        let body = body.map(RequestBody::into_parts).transpose()?;
        if let Some((payload, _)) = &body {
            if payload.len() > self.config().max_request_size {
                return Err(Error::invalid_request(format!(
                    "Request body {} bytes exceeds limit {} bytes",
                    payload.len(),
                    self.config().max_request_size
                )));
            }
        }

        let total_timeout = self.config().timeout;
        let attempt = || {
            let method = method.clone();
            let headers = headers.clone();
            let body = body.clone();
            async move { self.fetch_once(url, method, headers, body).await }
        };

        match tokio::time::timeout(total_timeout, self.execute_with_retry(attempt)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(timeout_ms = %total_timeout.as_millis(), "HTTP request timed out");
                Err(Error::timeout(format!(
                    "Request to {url} timed out after {}ms",
                    total_timeout.as_millis()
                )))
            }
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
        method: Method,
        headers: Option<HeaderMap>,
        body: Option<(String, Option<&'static str>)>,
    ) -> Result<Value> {
        let mut headers = headers.unwrap_or_default();
        let mut request = self.client().request(method, url);

        if let Some((payload, content_type)) = body {
            if let Some(ct) = content_type {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static(ct));
            }
            if self.config().verbose {
                debug!(body = %payload, "HTTP request body");
            }
            request = request.body(payload);
        }

        let response = request.headers(headers).send().await?;
        self.process_response_with_limit(response, url).await
    }

    /// GET.
    pub async fn get(&self, url: &str, headers: Option<HeaderMap>) -> Result<Value> {
        self.fetch(url, Method::GET, headers, None).await
    }

    /// POST with a JSON body.
    pub async fn post(&self, url: &str, headers: Option<HeaderMap>, body: Option<Value>) -> Result<Value> {
        self.fetch(url, Method::POST, headers, body.map(RequestBody::Json))
            .await
    }

    /// POST with a urlencoded body.
    pub async fn post_form(&self, url: &str, headers: Option<HeaderMap>, form: String) -> Result<Value> {
        self.fetch(url, Method::POST, headers, Some(RequestBody::Form(form)))
            .await
    }

    /// POST with a body that must go out byte for byte, such as a signed
    /// JSON document.
    pub async fn post_raw(&self, url: &str, headers: Option<HeaderMap>, body: String) -> Result<Value> {
        self.fetch(url, Method::POST, headers, Some(RequestBody::Raw(body)))
            .await
    }

    /// DELETE.
    pub async fn delete(&self, url: &str, headers: Option<HeaderMap>, body: Option<Value>) -> Result<Value> {
        self.fetch(url, Method::DELETE, headers, body.map(RequestBody::Json))
            .await
    }
}
