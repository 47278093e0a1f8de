//! Background reconnection driver.

use super::WsClient;
use super::event::WsEvent;
use super::state::WsConnectionState;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Watches a [`WsClient`] and reconnects it after it drops.
pub struct AutoReconnectCoordinator {
    client: Arc<WsClient>,
    cancel_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AutoReconnectCoordinator {
    /// Coordinator for `client`.
    pub fn new(client: Arc<WsClient>) -> Self {
        Self {
            client,
            cancel_token: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Whether the watch task runs.
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts the watch task. A second call is a no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        if !self.client.config().auto_reconnect {
            debug!("Auto-reconnect disabled by config");
            return;
        }
        info!("Starting auto-reconnect coordinator");
        let client = Arc::clone(&self.client);
        let token = self.cancel_token.clone();
        *task = Some(tokio::spawn(Self::reconnect_loop(client, token)));
    }

    /// Stops the watch task and any reconnect in flight.
    pub async fn stop(&self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
    }

    async fn reconnect_loop(client: Arc<WsClient>, token: CancellationToken) {
        let mut check_interval = interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                _ = check_interval.tick() => {}
            }

            let state = client.state();
            if !matches!(
                state,
                WsConnectionState::Disconnected | WsConnectionState::Error
            ) {
                continue;
            }

            client.emit_event(WsEvent::Disconnected {
                reason: Some(format!("{state:?}")),
            });

            match client.reconnect_with_cancel(Some(token.clone())).await {
                Ok(()) => info!("Reconnected"),
                Err(e) if e.as_cancelled().is_some() => break,
                Err(e) => {
                    warn!(error = %e, "Auto-reconnect giving up");
                    break;
                }
            }
        }
        debug!("Auto-reconnect loop terminated");
    }
}
