//! An established TCP byte stream.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

/// Result of one [`Connection::receive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    /// This many bytes were read into the buffer.
    Data(usize),
    /// The peer closed its side; no more data will arrive.
    Closed,
    /// The receive timeout elapsed with nothing to read. Retry.
    TimedOut,
}

/// One side of an accepted or connected TCP stream.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    closed: bool,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            closed: false,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Bounds each [`receive`](Self::receive). `None` or zero blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.stream
            .set_read_timeout(timeout.filter(|t| !t.is_zero()))
    }

    /// Reads at most `buf.len()` bytes.
    ///
    /// Timeouts are reported as [`RecvOutcome::TimedOut`] rather than as
    /// errors; signal interruptions are retried. Anything else is a real
    /// I/O failure.
    pub fn receive(&mut self, buf: &mut [u8]) -> std::io::Result<RecvOutcome> {
        loop {
            match self.stream.read(buf) {
                Ok(0) => return Ok(RecvOutcome::Closed),
                Ok(n) => return Ok(RecvOutcome::Data(n)),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(RecvOutcome::TimedOut);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends all of `bytes`, returning how many were sent.
    pub fn send(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.stream.write_all(bytes)?;
        Ok(bytes.len())
    }

    /// Shuts both directions down. Safe to call more than once.
    pub fn close(&mut self) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != ErrorKind::NotConnected => Err(e),
            _ => {
                debug!(peer = %self.peer, "connection closed");
                Ok(())
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
