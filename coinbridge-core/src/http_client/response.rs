use crate::error::{Error, NetworkError, Result};
use futures_util::StreamExt;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use super::builder::HttpClient;
use super::headers::retry_after;

const BODY_PREVIEW_SIZE: usize = 200;

impl HttpClient {
    #[instrument(name = "http_response", skip(self, response), fields(status, url = %url))]
    pub(crate) async fn process_response_with_limit(
        &self,
        response: Response,
        url: &str,
    ) -> Result<Value> {
        let status = response.status();
        let retry_after = retry_after(response.headers());
        let max_size = self.config().max_response_size;
        tracing::Span::current().record("status", status.as_u16());

        if let Some(len) = response.content_length() {
            if len > max_size as u64 {
                warn!(content_length = len, max_size, "response exceeds size limit");
                return Err(Error::invalid_request(format!(
                    "Response size {len} bytes exceeds limit {max_size} bytes"
                )));
            }
        }

        let body = Self::read_body(response, max_size).await?;
        let text = String::from_utf8_lossy(&body);
        let result = serde_json::from_slice::<Value>(&body)
            .unwrap_or_else(|_| Value::String(text.to_string()));
        let preview: String = text.chars().take(BODY_PREVIEW_SIZE).collect();
        debug!(status = %status, body_length = body.len(), body_preview = %preview, "HTTP response");

        if let Some(hook) = self.error_hook() {
            if let Some(err) = hook(status.as_u16(), &result) {
                warn!(status = status.as_u16(), error = %err, "exchange error response");
                return Err(err);
            }
        }

        if !status.is_success() {
            let err = Self::map_status(status, &text, retry_after);
            error!(status = status.as_u16(), error = %err, body_preview = %preview, "HTTP error response");
            return Err(err);
        }

        Ok(result)
    }

    async fn read_body(response: Response, max_size: usize) -> Result<Vec<u8>> {
        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > max_size {
                return Err(Error::invalid_request(format!(
                    "Response exceeds limit {max_size} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    pub(crate) fn map_status(
        status: StatusCode,
        body: &str,
        retry_after: Option<std::time::Duration>,
    ) -> Error {
        match status {
            StatusCode::BAD_REQUEST => Error::invalid_request(body.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::authentication(format!("{status}: {body}"))
            }
            StatusCode::NOT_FOUND => Error::invalid_request(format!("Not found: {body}")),
            StatusCode::TOO_MANY_REQUESTS => Error::rate_limit(
                retry_after.map_or_else(
                    || "Rate limit exceeded".to_string(),
                    |d| format!("Rate limit exceeded, retry after {}s", d.as_secs()),
                ),
                retry_after,
            ),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Error::from(NetworkError::Timeout)
            }
            s => Error::from(NetworkError::RequestFailed {
                status: s.as_u16(),
                message: body.chars().take(BODY_PREVIEW_SIZE).collect(),
            }),
        }
    }
}
