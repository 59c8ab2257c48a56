use std::path::PathBuf;
use std::sync::Arc;

use tcpft_pool::Pool;
use tracing::{Span, debug, info};

use crate::file::FileSource;
use crate::{StreamStats, Worker, WorkerError, WorkerHandle};

/// Send-side worker: reads a whole file and queues it into a [`Pool`].
///
/// The pool is closed when the worker ends, successfully or not, which is
/// the consumer's end-of-stream signal. Chunks already queued stay
/// available to drain.
#[derive(Debug)]
pub struct StreamReader {
    path: PathBuf,
    pool: Arc<Pool>,
    span: Span,
}

impl StreamReader {
    pub fn new(path: impl Into<PathBuf>, pool: Arc<Pool>) -> Self {
        Self {
            path: path.into(),
            pool,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Runs the reader on the calling thread.
    pub fn run(self) -> Result<StreamStats, WorkerError> {
        let (worker, prepare, work, finish) = self.into_parts();
        worker.run(prepare, work, finish)
    }

    /// Runs the reader on its own thread.
    pub fn spawn(self) -> Result<WorkerHandle<StreamStats>, WorkerError> {
        let (worker, prepare, work, finish) = self.into_parts();
        worker.spawn(prepare, work, finish)
    }

    fn into_parts(
        self,
    ) -> (
        Worker,
        impl FnOnce() -> Result<FileSource, WorkerError> + Send + 'static,
        impl FnOnce(&mut FileSource) -> Result<StreamStats, WorkerError> + Send + 'static,
        impl FnOnce(FileSource) + Send + 'static,
    ) {
        let worker = Worker::new("tcpft-reader").with_span(self.span);
        let path = self.path;
        let (prepare_pool, work_pool, finish_pool) =
            (Arc::clone(&self.pool), Arc::clone(&self.pool), self.pool);

        let prepare = move || {
            FileSource::open(&path).inspect_err(|_| {
                // Nothing will ever be queued; let the consumer see the end.
                prepare_pool.close();
            })
        };

        let work = move |src: &mut FileSource| -> Result<StreamStats, WorkerError> {
            let data = src.read_all()?;
            info!(path = %src.path().display(), size = data.len(), "source loaded");
            let chunks = work_pool.fit(&data).map_err(|_| WorkerError::PoolClosed)?;
            Ok(StreamStats {
                bytes: data.len() as u64,
                chunks: chunks as u64,
            })
        };

        let finish = move |src: FileSource| {
            debug!(path = %src.path().display(), "source released");
            drop(src);
            finish_pool.close();
        };

        (worker, prepare, work, finish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcpft_pool::{CHUNK_CAPACITY, OverflowPolicy};
    use tempfile::TempDir;

    #[test]
    fn queues_file_and_closes_pool() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.bin");
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 256) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let pool = Arc::new(Pool::new());
        let stats = StreamReader::new(&path, Arc::clone(&pool)).run().unwrap();

        assert_eq!(stats, StreamStats { bytes: 2500, chunks: 3 });
        assert!(pool.is_closed());
        assert_eq!(pool.count(), 3);
        assert_eq!(pool.drain_bytes(), data);
    }

    #[test]
    fn empty_file_closes_pool_without_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let pool = Arc::new(Pool::new());
        let stats = StreamReader::new(&path, Arc::clone(&pool)).run().unwrap();

        assert_eq!(stats, StreamStats::default());
        assert!(pool.is_closed());
        assert_eq!(pool.pop_wait().map(|c| c.len()), None);
    }

    #[test]
    fn missing_source_fails_and_still_closes_pool() {
        let dir = TempDir::new().unwrap();
        let pool = Arc::new(Pool::new());

        let handle = StreamReader::new(dir.path().join("missing.bin"), Arc::clone(&pool))
            .spawn()
            .unwrap();

        // A consumer waiting on the pool must be released.
        assert!(pool.pop_wait().is_none());
        assert!(matches!(handle.join(), Err(WorkerError::Open { .. })));
    }

    #[test]
    fn closed_pool_stops_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.bin");
        std::fs::write(&path, vec![1u8; 4 * CHUNK_CAPACITY]).unwrap();

        let pool = Arc::new(Pool::with_capacity(2, OverflowPolicy::Block));
        let handle = StreamReader::new(&path, Arc::clone(&pool)).spawn().unwrap();

        // Consumer gives up after one chunk; the reader is blocked on a full pool.
        assert!(pool.pop_wait().is_some());
        pool.close();

        assert!(matches!(handle.join(), Err(WorkerError::PoolClosed)));
    }

    #[test]
    fn spawned_reader_streams_to_concurrent_consumer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(300 * CHUNK_CAPACITY + 99)).map(|i| (i % 253) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let pool = Arc::new(Pool::with_capacity(8, OverflowPolicy::Block));
        let handle = StreamReader::new(&path, Arc::clone(&pool)).spawn().unwrap();

        let mut received = Vec::new();
        while let Some(chunk) = pool.pop_wait() {
            chunk.copy_into(&mut received);
        }

        let stats = handle.join().unwrap();
        assert_eq!(stats.bytes, data.len() as u64);
        assert_eq!(stats.chunks, 301);
        assert_eq!(received, data);
    }
}
