//! Connection state and counters.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};

/// Connection lifecycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsConnectionState {
    /// Not connected.
    Disconnected = 0,
    /// Handshake in progress.
    Connecting = 1,
    /// Open.
    Connected = 2,
    /// Waiting to reconnect.
    Reconnecting = 3,
    /// Failed; eligible for reconnect.
    Error = 4,
}

impl WsConnectionState {
    /// Decodes the atomic representation.
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Reconnecting,
            _ => Self::Error,
        }
    }

    /// Atomic representation.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Lock-free connection counters.
#[derive(Debug, Default)]
pub struct WsStats {
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    bytes_received: AtomicU64,
    last_message_time: AtomicI64,
    last_ping_time: AtomicI64,
    last_pong_time: AtomicI64,
    connected_at: AtomicI64,
    reconnect_attempts: AtomicU32,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl WsStats {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an inbound frame.
    pub fn record_received(&self, bytes: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        self.last_message_time.store(now_ms(), Ordering::Relaxed);
    }

    /// Counts an outbound frame.
    pub fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a ping.
    pub fn record_ping(&self) {
        self.last_ping_time.store(now_ms(), Ordering::Relaxed);
    }

    /// Marks a pong.
    pub fn record_pong(&self) {
        self.last_pong_time.store(now_ms(), Ordering::Relaxed);
    }

    /// Marks a successful connect and treats it as a fresh pong.
    pub fn record_connected(&self) {
        let now = now_ms();
        self.connected_at.store(now, Ordering::Relaxed);
        self.last_pong_time.store(now, Ordering::Relaxed);
    }

    /// Bumps and returns the reconnect counter.
    pub fn increment_reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last pong in milliseconds.
    pub fn last_pong_time(&self) -> i64 {
        self.last_pong_time.load(Ordering::Relaxed)
    }

    /// Copy of the counters.
    pub fn snapshot(&self) -> WsStatsSnapshot {
        WsStatsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            last_message_time: self.last_message_time.load(Ordering::Relaxed),
            last_ping_time: self.last_ping_time.load(Ordering::Relaxed),
            last_pong_time: self.last_pong_time.load(Ordering::Relaxed),
            connected_at: self.connected_at.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WsStats`].
#[derive(Debug, Clone, Default)]
pub struct WsStatsSnapshot {
    /// Frames received.
    pub messages_received: u64,
    /// Frames sent.
    pub messages_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Last inbound frame (ms).
    pub last_message_time: i64,
    /// Last ping (ms).
    pub last_ping_time: i64,
    /// Last pong (ms).
    pub last_pong_time: i64,
    /// Connect time (ms).
    pub connected_at: i64,
    /// Reconnects so far.
    pub reconnect_attempts: u32,
}

impl WsStatsSnapshot {
    /// Last pong minus last ping, when both are known.
    pub fn latency(&self) -> Option<i64> {
        (self.last_ping_time > 0 && self.last_pong_time >= self.last_ping_time)
            .then(|| self.last_pong_time - self.last_ping_time)
    }
}
