//! Transport-level failures.

use std::error::Error as StdError;
use thiserror::Error;

/// Network failure raised by the HTTP or WebSocket transports.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NetworkError {
    /// The server answered with an unexpected HTTP status.
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Body or reason phrase.
        message: String,
    },

    /// The request did not complete in time.
    #[error("Request timeout")]
    Timeout,

    /// The connection could not be established or was dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Underlying transport error.
    #[error("Transport error")]
    Transport(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl NetworkError {
    /// Returns the HTTP status for [`NetworkError::RequestFailed`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
