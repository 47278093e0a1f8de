//! WebSocket client.
//!
//! One connection per [`WsClient`]: a write task fed by a channel, a read
//! task that decodes JSON frames into [`WsClient::receive`], and an
//! optional keep-alive task. Subscribe frames are remembered by key and
//! replayed after every reconnect.

mod config;
mod event;
mod hub;
mod reconnect;
mod state;
mod subscription;

pub use config::{BackoffConfig, BackoffStrategy, DEFAULT_MAX_SUBSCRIPTIONS, WsConfig};
pub use event::{WsEvent, WsEventCallback};
pub use hub::{MessageHub, wait};
pub use reconnect::AutoReconnectCoordinator;
pub use state::{WsConnectionState, WsStats, WsStatsSnapshot};
pub use subscription::SubscriptionManager;

use crate::error::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, interval};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Text frame some venues send in reply to an application ping.
const PONG_TEXT: &str = "pong";

/// Async WebSocket client for exchange streaming APIs.
pub struct WsClient {
    config: WsConfig,
    state: Arc<AtomicU8>,
    subscriptions: SubscriptionManager,
    message_tx: mpsc::UnboundedSender<Value>,
    message_rx: Mutex<mpsc::UnboundedReceiver<Value>>,
    write_tx: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    shutdown_tx: Mutex<Option<mpsc::UnboundedSender<()>>>,
    reconnect_count: AtomicU32,
    stats: Arc<WsStats>,
    cancel_token: Mutex<Option<CancellationToken>>,
    event_callback: std::sync::Mutex<Option<WsEventCallback>>,
}

impl std::fmt::Debug for WsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClient")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .field("subscriptions", &self.subscriptions.count())
            .finish_non_exhaustive()
    }
}

impl WsClient {
    /// Client for `config`; nothing connects until [`connect`](Self::connect).
    pub fn new(config: WsConfig) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let max_subscriptions = config.max_subscriptions;

        Self {
            config,
            state: Arc::new(AtomicU8::new(WsConnectionState::Disconnected.as_u8())),
            subscriptions: SubscriptionManager::new(max_subscriptions),
            message_tx,
            message_rx: Mutex::new(message_rx),
            write_tx: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
            reconnect_count: AtomicU32::new(0),
            stats: Arc::new(WsStats::new()),
            cancel_token: Mutex::new(None),
            event_callback: std::sync::Mutex::new(None),
        }
    }

    /// Installs the lifecycle observer.
    pub fn set_event_callback(&self, callback: WsEventCallback) {
        *self
            .event_callback
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(callback);
    }

    pub(crate) fn emit_event(&self, event: WsEvent) {
        let callback = self
            .event_callback
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(cb) = callback {
            cb(event);
        }
    }

    /// Token checked by connect and reconnect; cancelled on shutdown.
    pub async fn set_cancel_token(&self, token: CancellationToken) {
        *self.cancel_token.lock().await = Some(token);
    }

    async fn token_or(&self, token: Option<CancellationToken>) -> CancellationToken {
        match token {
            Some(t) => t,
            None => self
                .cancel_token
                .lock()
                .await
                .clone()
                .unwrap_or_default(),
        }
    }

    /// Opens the connection and replays stored subscriptions.
    pub async fn connect(&self) -> Result<()> {
        self.connect_with_cancel(None).await
    }

    /// [`connect`](Self::connect) that aborts when `cancel_token` fires.
    #[instrument(
        name = "ws_connect",
        skip(self, cancel_token),
        fields(url = %self.config.url, timeout_ms = self.config.connect_timeout)
    )]
    pub async fn connect_with_cancel(&self, cancel_token: Option<CancellationToken>) -> Result<()> {
        if self.is_connected() {
            debug!("WebSocket already connected");
            return Ok(());
        }
        let token = self.token_or(cancel_token).await;
        self.set_state(WsConnectionState::Connecting);

        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                warn!("WebSocket connection cancelled");
                self.set_state(WsConnectionState::Disconnected);
                return Err(Error::cancelled("WebSocket connection cancelled"));
            }
            result = tokio::time::timeout(
                Duration::from_millis(self.config.connect_timeout),
                connect_async(self.config.url.as_str()),
            ) => result,
        };

        match result {
            Ok(Ok((ws_stream, response))) => {
                info!(status = response.status().as_u16(), "WebSocket connected");
                self.set_state(WsConnectionState::Connected);
                self.stats.record_connected();
                self.start_message_loop(ws_stream).await;
                self.emit_event(WsEvent::Connected);
                self.resubscribe_all().await
            }
            Ok(Err(e)) => {
                error!(error = %e, "WebSocket connection failed");
                self.set_state(WsConnectionState::Error);
                Err(Error::network(format!("WebSocket connection failed: {e}")))
            }
            Err(_) => {
                error!("WebSocket connection timeout");
                self.set_state(WsConnectionState::Error);
                Err(Error::timeout("WebSocket connection timeout"))
            }
        }
    }

    /// Closes the connection, forgets subscriptions and cancels the token.
    #[instrument(name = "ws_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        if let Some(token) = self.cancel_token.lock().await.as_ref() {
            token.cancel();
        }
        self.set_state(WsConnectionState::Disconnected);

        let shutdown_timeout = Duration::from_millis(self.config.shutdown_timeout);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            if let Some(tx) = self.shutdown_tx.lock().await.as_ref() {
                let _ = tx.send(());
            }
        })
        .await;

        *self.write_tx.lock().await = None;
        *self.shutdown_tx.lock().await = None;
        self.subscriptions.clear();
        self.reconnect_count.store(0, Ordering::Release);

        self.emit_event(WsEvent::Shutdown);
        info!("WebSocket shut down");
    }

    /// Reconnects with exponential backoff until connected, cancelled, a
    /// non-retryable error occurs or the attempt budget runs out.
    #[instrument(name = "ws_reconnect", skip(self, cancel_token))]
    pub async fn reconnect_with_cancel(
        &self,
        cancel_token: Option<CancellationToken>,
    ) -> Result<()> {
        let token = self.token_or(cancel_token).await;
        let backoff = BackoffStrategy::new(self.config.backoff_config.clone());
        self.set_state(WsConnectionState::Reconnecting);

        loop {
            let attempt = self.reconnect_count.fetch_add(1, Ordering::AcqRel);
            if attempt >= self.config.max_reconnect_attempts {
                self.set_state(WsConnectionState::Error);
                self.emit_event(WsEvent::ReconnectExhausted { attempts: attempt });
                return Err(Error::network(format!(
                    "Max reconnect attempts ({}) reached",
                    self.config.max_reconnect_attempts
                )));
            }
            self.stats.increment_reconnect_attempts();

            let delay = backoff.calculate_delay(attempt);
            self.emit_event(WsEvent::Reconnecting {
                attempt: attempt + 1,
                delay,
            });
            warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::select! {
                biased;
                () = token.cancelled() => {
                    self.set_state(WsConnectionState::Disconnected);
                    return Err(Error::cancelled("Reconnection cancelled during backoff"));
                }
                () = tokio::time::sleep(delay) => {}
            }

            match self.connect_with_cancel(Some(token.clone())).await {
                Ok(()) => {
                    self.reconnect_count.store(0, Ordering::Release);
                    return Ok(());
                }
                Err(e) if e.as_cancelled().is_some() || !e.is_retryable() => return Err(e),
                Err(e) => debug!(error = %e, "Reconnect attempt failed"),
            }
        }
    }

    /// Reconnect attempts since the last successful connect.
    #[inline]
    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count.load(Ordering::Acquire)
    }

    /// Snapshot of the connection counters.
    pub fn stats(&self) -> WsStatsSnapshot {
        self.stats.snapshot()
    }

    /// Remembers `frame` under `key` and sends it when connected.
    /// Subscribing twice with the same key sends nothing the second time.
    #[instrument(name = "ws_subscribe", skip(self, frame))]
    pub async fn subscribe(&self, key: &str, frame: Value) -> Result<()> {
        if !self.subscriptions.try_add(key, frame.clone())? {
            return Ok(());
        }
        if self.is_connected() {
            self.send_json(&frame).await?;
        }
        Ok(())
    }

    /// Forgets `key` and sends `frame` when connected.
    #[instrument(name = "ws_unsubscribe", skip(self, frame))]
    pub async fn unsubscribe(&self, key: &str, frame: Value) -> Result<()> {
        self.subscriptions.remove(key);
        if self.is_connected() {
            self.send_json(&frame).await?;
        }
        Ok(())
    }

    /// Whether `key` is subscribed.
    pub fn is_subscribed(&self, key: &str) -> bool {
        self.subscriptions.contains(key)
    }

    /// Stored subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.count()
    }

    /// Next decoded frame, or `None` once the client is dropped.
    pub async fn receive(&self) -> Option<Value> {
        self.message_rx.lock().await.recv().await
    }

    /// Current connection state.
    #[inline]
    pub fn state(&self) -> WsConnectionState {
        WsConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Connection settings.
    #[inline]
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    #[inline]
    fn set_state(&self, state: WsConnectionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Whether the connection is open.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state() == WsConnectionState::Connected
    }

    /// Queues a frame for the write task.
    pub async fn send(&self, message: Message) -> Result<()> {
        let tx = self.write_tx.lock().await;
        let sender = tx
            .as_ref()
            .ok_or_else(|| Error::network("WebSocket not connected"))?;
        sender
            .send(message)
            .map_err(|e| Error::network(format!("Failed to send message: {e}")))?;
        self.stats.record_sent();
        Ok(())
    }

    /// Sends a text frame.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        let text: String = text.into();
        self.send(Message::Text(text.into())).await
    }

    /// Sends `json` as a text frame.
    pub async fn send_json(&self, json: &Value) -> Result<()> {
        let text = serde_json::to_string(json)?;
        self.send_text(text).await
    }

    async fn resubscribe_all(&self) -> Result<()> {
        for frame in self.subscriptions.collect_frames() {
            self.send_json(&frame).await?;
        }
        Ok(())
    }

    async fn start_message_loop(&self, ws_stream: WsStream) {
        let (mut write, mut read) = ws_stream.split();

        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<Message>();
        *self.write_tx.lock().await = Some(write_tx.clone());
        let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel::<()>();
        *self.shutdown_tx.lock().await = Some(shutdown_tx);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(msg) = write_rx.recv() => {
                        if let Err(e) = write.send(msg).await {
                            error!(error = %e, "Failed to write message");
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);
        let message_tx = self.message_tx.clone();
        tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        stats.record_received(text.len() as u64);
                        if text.as_str() == PONG_TEXT {
                            stats.record_pong();
                        } else if let Some(json) = decode_frame(text.as_bytes()) {
                            let _ = message_tx.send(json);
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        stats.record_received(data.len() as u64);
                        if let Some(json) = decode_frame(&data) {
                            let _ = message_tx.send(json);
                        }
                    }
                    Ok(Message::Pong(_)) => stats.record_pong(),
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "WebSocket closed by peer");
                        state.store(WsConnectionState::Disconnected.as_u8(), Ordering::Release);
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "WebSocket read failed");
                        state.store(WsConnectionState::Error.as_u8(), Ordering::Release);
                        break;
                    }
                    _ => {}
                }
            }
        });

        let ping_interval_ms = self.config.ping_interval;
        if ping_interval_ms > 0 {
            let stats = Arc::clone(&self.stats);
            let state = Arc::clone(&self.state);
            let pong_timeout_ms = i64::try_from(self.config.pong_timeout).unwrap_or(i64::MAX);
            let app_ping = self.config.app_ping.clone();

            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_millis(ping_interval_ms));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let elapsed = chrono::Utc::now().timestamp_millis() - stats.last_pong_time();
                    if elapsed > pong_timeout_ms {
                        warn!(elapsed_ms = elapsed, "Pong timeout");
                        state.store(WsConnectionState::Error.as_u8(), Ordering::Release);
                        break;
                    }
                    stats.record_ping();
                    let ping = match &app_ping {
                        Some(text) => Message::Text(text.clone().into()),
                        None => Message::Ping(Vec::new().into()),
                    };
                    if write_tx.send(ping).is_err() {
                        break;
                    }
                }
            });
        }
    }
}

fn decode_frame(bytes: &[u8]) -> Option<Value> {
    match serde_json::from_slice(bytes) {
        Ok(json) => Some(json),
        Err(e) => {
            debug!(error = %e, "Dropping non-JSON frame");
            None
        }
    }
}
