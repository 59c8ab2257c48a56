//! Send side: file → pool → socket.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tcpft_net::{Connection, TcpClient};
use tcpft_pool::{CHUNK_CAPACITY, Pool};
use tcpft_worker::{StreamReader, StreamStats};
use tracing::{Span, debug, info, info_span, warn};

use crate::{TransferConfig, TransferError, TransferReport};

/// Streams one file to a connected receiver.
pub struct Transmitter {
    conn: Connection,
    config: TransferConfig,
    span: Span,
}

impl Transmitter {
    /// Connects to the receiver at `addr:port`.
    pub fn connect(addr: &str, port: u16, config: TransferConfig) -> Result<Self, TransferError> {
        let conn = TcpClient::connect_with(addr, port, config.connect_timeout())?;
        let span = info_span!("transmitter", peer = %conn.peer_addr());
        Ok(Self { conn, config, span })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }

    /// Reads `location` on a worker thread and sends it chunk by chunk.
    ///
    /// The connection stays open afterwards; the receiver only sees the
    /// end of the stream once [`close`](Self::close) runs or `self` drops.
    pub fn transmit(
        &mut self,
        location: impl AsRef<Path>,
    ) -> Result<TransferReport, TransferError> {
        let span = self.span.clone();
        let _entered = span.enter();
        let location: PathBuf = location.as_ref().to_path_buf();
        let started = Instant::now();

        let pool = Arc::new(Pool::with_policy(self.config.overflow));
        let reader = StreamReader::new(&location, Arc::clone(&pool))
            .with_span(span.clone())
            .spawn()?;

        info!(location = %location.display(), "transmit started");
        let sent = self.drain(&pool);
        if sent.is_err() {
            // Unblocks a reader waiting for room.
            pool.close();
        }
        let read = reader.join();

        match (sent, read) {
            (Err(e), _) => {
                warn!(error = %e, "transmit failed on socket");
                Err(e.into())
            }
            (Ok(_), Err(e)) => {
                warn!(error = %e, "transmit failed in file reader");
                Err(e.into())
            }
            (Ok(sent), Ok(read)) => {
                if let Some(lost) = dropped_chunks(&read, &sent) {
                    warn!(
                        read = read.bytes,
                        sent = sent.bytes,
                        lost_chunks = lost,
                        "pool dropped chunks under drop-oldest policy"
                    );
                }
                let report = TransferReport {
                    bytes: sent.bytes,
                    chunks: sent.chunks,
                    elapsed: started.elapsed(),
                };
                info!(
                    bytes = report.bytes,
                    chunks = report.chunks,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "transmit complete"
                );
                Ok(report)
            }
        }
    }

    /// Sends chunks until the reader closes the pool and it runs dry.
    fn drain(&mut self, pool: &Pool) -> std::io::Result<StreamStats> {
        let mut stats = StreamStats::default();
        let mut buf = Vec::with_capacity(CHUNK_CAPACITY);

        while let Some(chunk) = pool.pop_wait() {
            buf.clear();
            chunk.copy_into(&mut buf);
            let n = self.conn.send(&buf)?;
            stats.bytes += n as u64;
            stats.chunks += 1;
            debug!(chunk = stats.chunks, size = n, "sent");
        }
        Ok(stats)
    }

    /// Shuts the connection down, which ends the receiver's stream.
    pub fn close(&mut self) -> Result<(), TransferError> {
        self.conn.close()?;
        Ok(())
    }
}

/// Chunks the reader queued that never reached the socket, if any.
fn dropped_chunks(read: &StreamStats, sent: &StreamStats) -> Option<u64> {
    (read.bytes != sent.bytes).then(|| read.chunks.saturating_sub(sent.chunks))
}

/// Connects to `addr:port`, sends `location`, and closes the connection
/// whether or not the send succeeded.
pub fn send_file(
    addr: &str,
    port: u16,
    location: impl AsRef<Path>,
    config: TransferConfig,
) -> Result<TransferReport, TransferError> {
    let mut transmitter = Transmitter::connect(addr, port, config)?;
    let result = transmitter.transmit(location);
    let closed = transmitter.close();
    let report = result?;
    closed?;
    Ok(report)
}
