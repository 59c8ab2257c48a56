//! File-facing workers for the chunk pipeline.
//!
//! A [`Worker`] drives a prepare → work → finish lifecycle on its own
//! thread. [`StreamReader`] fills a [`Pool`](tcpft_pool::Pool) from a file
//! and closes it when done; [`StreamWriter`] drains a pool into a file until
//! the pool is closed and empty.

pub mod file;
mod lifecycle;
mod reader;
mod writer;

pub use file::{FileSink, FileSource};
pub use lifecycle::{Worker, WorkerHandle, WorkerState};
pub use reader::StreamReader;
pub use writer::StreamWriter;

use std::path::PathBuf;

/// Bytes and chunks a stream worker moved through its pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub bytes: u64,
    pub chunks: u64,
}

/// Errors produced by workers.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pool closed before the stream was fully queued")]
    PoolClosed,

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}
