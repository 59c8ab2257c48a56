use crate::{BoundedRing, CHUNK_CAPACITY, Chunk, OverflowPolicy, POOL_CAPACITY, PushError};

/// Ordered queue of [`Chunk`]s standing for the not-yet-consumed part of a
/// byte stream.
///
/// Chunk order in the pool equals byte order in the stream. Completion is
/// signalled with [`close`](Self::close), never with a marker chunk, so any
/// byte value is valid payload.
#[derive(Debug, Clone)]
pub struct Pool {
    chunks: BoundedRing<Chunk>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Creates a pool of [`POOL_CAPACITY`] chunks that blocks producers when
    /// full.
    pub fn new() -> Self {
        Self::with_policy(OverflowPolicy::Block)
    }

    pub fn with_policy(policy: OverflowPolicy) -> Self {
        Self::with_capacity(POOL_CAPACITY, policy)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            chunks: BoundedRing::new(capacity, policy),
        }
    }

    /// Splits `data` into consecutive chunks of at most [`CHUNK_CAPACITY`]
    /// bytes and pushes them in order. Returns the number of chunks pushed.
    ///
    /// Empty input pushes nothing. If the pool is closed part-way through,
    /// the chunks pushed so far stay queued and the error carries the first
    /// rejected chunk.
    pub fn fit(&self, data: &[u8]) -> Result<usize, PushError<Chunk>> {
        let mut pushed = 0;
        for slice in data.chunks(CHUNK_CAPACITY) {
            self.chunks.push(Chunk::from_slice(slice))?;
            pushed += 1;
        }
        Ok(pushed)
    }

    /// Pops every chunk queued right now and concatenates their bytes.
    /// Does not wait for more.
    pub fn drain_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = self.chunks.pop() {
            chunk.copy_into(&mut out);
        }
        out
    }

    pub fn push(&self, chunk: Chunk) -> Result<(), PushError<Chunk>> {
        self.chunks.push(chunk)
    }

    pub fn pop(&self) -> Option<Chunk> {
        self.chunks.pop()
    }

    /// Next chunk, blocking until one arrives. `None` once the pool is closed
    /// and drained.
    pub fn pop_wait(&self) -> Option<Chunk> {
        self.chunks.pop_wait()
    }

    /// Signals end-of-stream and wakes every waiter.
    pub fn close(&self) {
        self.chunks.close();
    }

    pub fn is_closed(&self) -> bool {
        self.chunks.is_closed()
    }

    pub fn count(&self) -> usize {
        self.chunks.count()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.chunks.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.chunks.capacity()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.chunks.policy()
    }

    pub fn wait_for_not_empty(&self) {
        self.chunks.wait_for_not_empty();
    }

    pub fn wait_for_empty(&self) {
        self.chunks.wait_for_empty();
    }

    /// The underlying ring, for the wait predicates not mirrored here.
    pub fn ring(&self) -> &BoundedRing<Chunk> {
        &self.chunks
    }
}
