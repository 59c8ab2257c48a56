//! Receive side: socket → pool → file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tcpft_net::{Connection, RecvOutcome, TcpServer};
use tcpft_pool::{CHUNK_CAPACITY, Pool};
use tcpft_worker::{StreamWriter, WorkerError};
use tracing::{Span, debug, info, info_span, trace, warn};

use crate::{TransferConfig, TransferError, TransferReport};

/// Listens for one sender and writes what it streams into a file.
pub struct Receiver {
    server: TcpServer,
    config: TransferConfig,
    span: Span,
}

/// How the socket loop ended when it did not fail outright.
enum PumpEnd {
    /// Peer closed its side.
    Drained,
    /// The pool stopped accepting chunks, so the writer is gone.
    WriterGone,
}

impl Receiver {
    /// Binds and listens on `addr:port`.
    pub fn bind(addr: &str, port: u16, config: TransferConfig) -> Result<Self, TransferError> {
        let server = TcpServer::init(addr, port, config.recv_timeout())?;
        let span = info_span!("receiver", local = %server.local_addr());
        Ok(Self {
            server,
            config,
            span,
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Accepts one sender and writes its stream into `location`.
    ///
    /// The file writer starts before the accept. If it dies before a sender
    /// arrives (the destination cannot be created, say), accepting stops
    /// and the writer's error is returned.
    pub fn receive(
        &mut self,
        location: impl AsRef<Path>,
    ) -> Result<TransferReport, TransferError> {
        let span = self.span.clone();
        let _entered = span.enter();
        let location: PathBuf = location.as_ref().to_path_buf();
        let started = Instant::now();

        let pool = Arc::new(Pool::with_policy(self.config.overflow));
        let writer = StreamWriter::new(&location, Arc::clone(&pool))
            .with_span(span.clone())
            .spawn()?;

        // The writer only closes the pool early when it has failed.
        let accepted = self
            .server
            .accept_unless(self.config.accept_timeout(), || pool.is_closed());
        let mut conn = match accepted {
            Ok(Some(conn)) => conn,
            Ok(None) => {
                let err = match writer.join() {
                    Err(e) => e,
                    Ok(_) => WorkerError::PoolClosed,
                };
                warn!(error = %err, "file writer stopped before a sender connected");
                return Err(err.into());
            }
            Err(e) => {
                pool.close();
                if let Err(written) = writer.join() {
                    warn!(error = %written, accept = %e, "receive failed in file writer");
                    return Err(written.into());
                }
                return Err(e.into());
            }
        };

        info!(peer = %conn.peer_addr(), location = %location.display(), "receive started");
        let pumped = pump(&mut conn, &pool, &self.config);

        // Lets the writer drain what is queued and return.
        pool.close();
        if let Err(e) = conn.close() {
            debug!(error = %e, "connection shutdown failed");
        }
        let written = writer.join();

        match (pumped, written) {
            (_, Err(e)) => {
                warn!(error = %e, "receive failed in file writer");
                Err(e.into())
            }
            (Err(e), Ok(_)) => {
                warn!(error = %e, "receive failed on socket");
                Err(e)
            }
            (Ok(PumpEnd::WriterGone), Ok(_)) => Err(WorkerError::PoolClosed.into()),
            (Ok(PumpEnd::Drained), Ok(stats)) => {
                let report = TransferReport {
                    bytes: stats.bytes,
                    chunks: stats.chunks,
                    elapsed: started.elapsed(),
                };
                info!(
                    bytes = report.bytes,
                    chunks = report.chunks,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "receive complete"
                );
                Ok(report)
            }
        }
    }

    /// Stops listening.
    pub fn close(&mut self) {
        self.server.close();
    }
}

/// Reads the socket until the peer closes, fitting each read into the pool.
fn pump(
    conn: &mut Connection,
    pool: &Pool,
    config: &TransferConfig,
) -> Result<PumpEnd, TransferError> {
    let mut buf = vec![0u8; CHUNK_CAPACITY];
    let mut reads: u64 = 0;
    let mut idle: u32 = 0;

    loop {
        match conn.receive(&mut buf)? {
            RecvOutcome::Data(n) => {
                idle = 0;
                reads += 1;
                debug!(read = reads, size = n, "received");
                if pool.fit(&buf[..n]).is_err() {
                    warn!("file writer stopped; abandoning receive");
                    return Ok(PumpEnd::WriterGone);
                }
            }
            RecvOutcome::Closed => {
                debug!(reads, "peer closed the stream");
                return Ok(PumpEnd::Drained);
            }
            RecvOutcome::TimedOut => {
                idle += 1;
                trace!(idle, "receive timed out");
                if config.max_idle_reads > 0 && idle >= config.max_idle_reads {
                    return Err(TransferError::Idle(idle));
                }
            }
        }
    }
}

/// Binds `addr:port`, receives one file into `location`, and stops
/// listening.
pub fn receive_file(
    addr: &str,
    port: u16,
    location: impl AsRef<Path>,
    config: TransferConfig,
) -> Result<TransferReport, TransferError> {
    let mut receiver = Receiver::bind(addr, port, config)?;
    let result = receiver.receive(location);
    receiver.close();
    result
}
