//! Error types for socket setup.

use std::net::SocketAddr;
use std::time::Duration;

/// Failures while establishing a connection. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("socket option failed: {0}")]
    SocketOption(#[source] std::io::Error),

    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("no connection accepted within {0:?}")]
    AcceptTimeout(Duration),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

impl SetupError {
    /// Stable numeric status for logs and exit codes (0 is success).
    pub fn code(&self) -> i32 {
        match self {
            SetupError::SocketOption(_) => -3,
            SetupError::InvalidAddress(_) => -4,
            SetupError::Bind { .. } => -5,
            SetupError::Accept(_) | SetupError::AcceptTimeout(_) => -6,
            SetupError::Connect { .. } => -7,
        }
    }
}
