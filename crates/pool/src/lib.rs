//! Chunked buffering between a socket thread and a file thread.
//!
//! A [`Pool`] is a [`BoundedRing`] of [`Chunk`]s. Producers split a byte
//! stream into chunks with [`Pool::fit`]; consumers take them back out with
//! [`BoundedRing::pop_wait`] until the producer calls [`BoundedRing::close`]
//! and the queue has drained.

mod bounded;
mod chunk;
mod pool;
mod ring;

pub use bounded::BoundedRing;
pub use chunk::Chunk;
pub use pool::Pool;
pub use ring::Ring;

use serde::{Deserialize, Serialize};

/// Number of bytes a single [`Chunk`] holds.
pub const CHUNK_CAPACITY: usize = 1024;

/// Number of chunks a [`Pool`] holds before its overflow policy applies.
pub const POOL_CAPACITY: usize = 1024;

/// What a [`BoundedRing`] does when an item is pushed while it is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Wait until a consumer frees a slot. Nothing is ever lost.
    #[default]
    Block,
    /// Evict the head element to make room. Lossy when producers outrun
    /// consumers by more than the ring's capacity.
    DropOldest,
}

/// Errors returned when pushing into a ring.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PushError<T> {
    /// The ring was closed; the rejected item is handed back.
    #[error("ring is closed")]
    Closed(T),
}

impl<T> PushError<T> {
    /// Recovers the item that could not be pushed.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Closed(item) => item,
        }
    }
}
