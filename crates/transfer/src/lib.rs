//! Single-file transfer over one TCP connection.
//!
//! Each side runs two threads: the caller's thread drives the socket, a
//! worker thread drives the file, and they meet in a dedicated
//! [`Pool`](tcpft_pool::Pool).
//!
//! - [`Transmitter`]: file → [`StreamReader`](tcpft_worker::StreamReader) →
//!   pool → socket.
//! - [`Receiver`]: socket → pool →
//!   [`StreamWriter`](tcpft_worker::StreamWriter) → file.

mod config;
mod receiver;
mod transmitter;

pub use config::TransferConfig;
pub use receiver::{Receiver, receive_file};
pub use transmitter::{Transmitter, send_file};

use std::time::Duration;

use tcpft_net::SetupError;
use tcpft_worker::WorkerError;

/// Summary of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Bytes written to the socket (send side) or the file (receive side).
    pub bytes: u64,
    /// Chunks that passed through the pool.
    pub chunks: u64,
    pub elapsed: Duration,
}

/// Errors produced by a transfer session.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("worker failed: {0}")]
    Worker(#[from] WorkerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer sent nothing for {0} consecutive receive timeouts")]
    Idle(u32),
}

impl TransferError {
    /// Whether the failure happened before any byte could move.
    pub fn is_setup(&self) -> bool {
        matches!(self, TransferError::Setup(_))
    }
}
