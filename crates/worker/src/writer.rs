use std::path::PathBuf;
use std::sync::Arc;

use tcpft_pool::Pool;
use tracing::{Span, debug, info, warn};

use crate::file::FileSink;
use crate::{StreamStats, Worker, WorkerError, WorkerHandle};

/// Receive-side worker: drains a [`Pool`] into a file.
///
/// Keeps writing until the pool is closed *and* empty; chunks queued before
/// the close are always written. When it ends for any reason the pool is
/// closed, so a producer still pushing gets an error instead of waiting on
/// a consumer that is gone.
#[derive(Debug)]
pub struct StreamWriter {
    path: PathBuf,
    pool: Arc<Pool>,
    span: Span,
}

impl StreamWriter {
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

    /// Runs the writer on the calling thread.
    pub fn run(self) -> Result<StreamStats, WorkerError> {
        let (worker, prepare, work, finish) = self.into_parts();
        worker.run(prepare, work, finish)
    }

    /// Runs the writer on its own thread.
    pub fn spawn(self) -> Result<WorkerHandle<StreamStats>, WorkerError> {
        let (worker, prepare, work, finish) = self.into_parts();
        worker.spawn(prepare, work, finish)
    }

    fn into_parts(
        self,
    ) -> (
        Worker,
        impl FnOnce() -> Result<FileSink, WorkerError> + Send + 'static,
        impl FnOnce(&mut FileSink) -> Result<StreamStats, WorkerError> + Send + 'static,
        impl FnOnce(FileSink) + Send + 'static,
    ) {
        let worker = Worker::new("tcpft-writer").with_span(self.span);
        let path = self.path;
        let (prepare_pool, work_pool, finish_pool) =
            (Arc::clone(&self.pool), Arc::clone(&self.pool), self.pool);

        let prepare = move || {
            FileSink::create(&path).inspect_err(|_| prepare_pool.close())
        };

        let work = move |sink: &mut FileSink| -> Result<StreamStats, WorkerError> {
            let mut stats = StreamStats::default();
            while let Some(chunk) = work_pool.pop_wait() {
                let (head, tail) = chunk.as_slices();
                sink.write(head)?;
                sink.write(tail)?;
                stats.bytes += chunk.len() as u64;
                stats.chunks += 1;
                debug!(chunk = stats.chunks, size = chunk.len(), "chunk written");
            }
            // A failed sync lands in the worker result, not just the log.
            sink.sync()?;
            info!(
                path = %sink.path().display(),
                bytes = stats.bytes,
                chunks = stats.chunks,
                "destination written"
            );
            Ok(stats)
        };

        let finish = move |sink: FileSink| {
            let path = sink.path().to_path_buf();
            if let Err(e) = sink.close() {
                warn!(path = %path.display(), error = %e, "closing destination failed");
            }
            finish_pool.close();
        };

        (worker, prepare, work, finish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use tcpft_pool::{CHUNK_CAPACITY, OverflowPolicy};
    use tempfile::TempDir;

    #[test]
    fn writes_queued_chunks_then_stops_on_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 256) as u8).collect();

        let pool = Arc::new(Pool::new());
        pool.fit(&data).unwrap();
        pool.close();

        let stats = StreamWriter::new(&path, Arc::clone(&pool)).run().unwrap();

        assert_eq!(stats, StreamStats { bytes: 2500, chunks: 3 });
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[test]
    fn closed_empty_pool_yields_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");

        let pool = Arc::new(Pool::new());
        pool.close();

        let stats = StreamWriter::new(&path, pool).run().unwrap();

        assert_eq!(stats, StreamStats::default());
        assert_eq!(std::fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn does_not_finish_while_open_even_if_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");

        let pool = Arc::new(Pool::new());
        let handle = StreamWriter::new(&path, Arc::clone(&pool)).spawn().unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished(), "writer must wait for close");

        pool.fit(b"late").unwrap();
        pool.close();

        assert_eq!(handle.join().unwrap().bytes, 4);
        assert_eq!(std::fs::read(&path).unwrap(), b"late");
    }

    #[test]
    fn binary_zero_bytes_are_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zeros.bin");
        let data = vec![0u8; 3 * CHUNK_CAPACITY + 5];

        let pool = Arc::new(Pool::new());
        let handle = StreamWriter::new(&path, Arc::clone(&pool)).spawn().unwrap();
        pool.fit(&data).unwrap();
        pool.close();

        assert_eq!(handle.join().unwrap().bytes, data.len() as u64);
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[test]
    fn unwritable_destination_fails_and_closes_pool() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out.bin");

        let pool = Arc::new(Pool::with_capacity(1, OverflowPolicy::Block));
        let handle = StreamWriter::new(&path, Arc::clone(&pool)).spawn().unwrap();

        assert!(matches!(handle.join(), Err(WorkerError::Open { .. })));
        // A producer must be rejected, not parked on a full pool.
        pool.fit(b"x").unwrap_err();
        pool.fit(b"y").unwrap_err();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_sync_is_reported_in_result() {
        // /dev/full accepts the open and the buffered writes, then fails
        // once the bytes are pushed to the device.
        let pool = Arc::new(Pool::new());
        pool.fit(&[1u8; 100]).unwrap();
        pool.close();

        let result = StreamWriter::new("/dev/full", Arc::clone(&pool)).run();

        assert!(matches!(result, Err(WorkerError::Io(_))));
        assert!(pool.is_closed());
    }
}
