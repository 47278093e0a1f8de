//! Connection lifecycle events.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle notification delivered to a [`WsEventCallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    /// Handshake completed.
    Connected,
    /// The connection closed or failed.
    Disconnected {
        /// Reason, when known.
        reason: Option<String>,
    },
    /// A reconnect is scheduled.
    Reconnecting {
        /// One-based attempt number.
        attempt: u32,
        /// Delay before the attempt.
        delay: Duration,
    },
    /// Reconnect attempts are used up.
    ReconnectExhausted {
        /// Attempts made.
        attempts: u32,
    },
    /// [`WsClient::shutdown`](super::WsClient::shutdown) finished.
    Shutdown,
}

impl WsEvent {
    /// Whether the connection is unusable after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReconnectExhausted { .. } | Self::Shutdown)
    }
}

impl fmt::Display for WsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("Connected"),
            Self::Disconnected { reason: Some(r) } => write!(f, "Disconnected: {r}"),
            Self::Disconnected { reason: None } => f.write_str("Disconnected"),
            Self::Reconnecting { attempt, delay } => {
                write!(f, "Reconnecting (attempt {attempt}, delay {}ms)", delay.as_millis())
            }
            Self::ReconnectExhausted { attempts } => {
                write!(f, "ReconnectExhausted after {attempts} attempts")
            }
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Observer for [`WsEvent`]s. Runs on the connection tasks, keep it short.
pub type WsEventCallback = Arc<dyn Fn(WsEvent) + Send + Sync>;
