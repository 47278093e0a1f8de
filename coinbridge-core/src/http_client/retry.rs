use crate::error::Result;
use serde_json::Value;
use tracing::{debug, warn};

use super::builder::HttpClient;

impl HttpClient {
    pub(crate) async fn execute_with_retry<F, Fut>(&self, operation: F) -> Result<Value>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Value>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(response) => {
                    debug!(attempt = attempt + 1, "request succeeded");
                    return Ok(response);
                }
                Err(e) if self.retry_strategy().should_retry(&e, attempt) => {
                    let delay = self.retry_strategy().calculate_delay(attempt, &e);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
