//! TCP server (receiving side).
//!
//! Binds and listens on a fixed address, then accepts a single connection
//! whose reads are bounded by a receive timeout.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::SetupError;
use crate::{ACCEPT_POLL_INTERVAL, socket_addr};

/// Listening socket for one incoming transfer.
#[derive(Debug)]
pub struct TcpServer {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    recv_timeout: Duration,
}

impl TcpServer {
    /// Binds `addr:port` and starts listening.
    ///
    /// Port 0 picks an ephemeral port; see [`local_addr`](Self::local_addr).
    pub fn init(addr: &str, port: u16, recv_timeout: Duration) -> Result<Self, SetupError> {
        let addr = socket_addr(addr, port)?;
        let listener =
            TcpListener::bind(addr).map_err(|source| SetupError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(SetupError::SocketOption)?;

        info!(%local_addr, "tcp server listening");

        Ok(Self {
            listener: Some(listener),
            local_addr,
            recv_timeout,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn recv_timeout(&self) -> Duration {
        self.recv_timeout
    }

    /// Accepts one connection and applies the receive timeout to it.
    ///
    /// With `timeout` set, gives up with [`SetupError::AcceptTimeout`] once
    /// it elapses; otherwise waits indefinitely.
    pub fn accept(&self, timeout: Option<Duration>) -> Result<Connection, SetupError> {
        self.accept_unless(timeout, || false)?.ok_or_else(|| {
            SetupError::Accept(std::io::Error::new(
                ErrorKind::Interrupted,
                "accept abandoned",
            ))
        })
    }

    /// Like [`accept`](Self::accept), but checks `abandon` on every poll
    /// tick and returns `Ok(None)` once it reports true.
    pub fn accept_unless<F>(
        &self,
        timeout: Option<Duration>,
        mut abandon: F,
    ) -> Result<Option<Connection>, SetupError>
    where
        F: FnMut() -> bool,
    {
        let listener = self.listener.as_ref().ok_or_else(|| {
            SetupError::Accept(std::io::Error::new(
                ErrorKind::NotConnected,
                "server is closed",
            ))
        })?;

        let Some((stream, peer)) = poll_accept(listener, timeout, &mut abandon)? else {
            debug!(local_addr = %self.local_addr, "accept abandoned");
            return Ok(None);
        };

        stream
            .set_nonblocking(false)
            .map_err(SetupError::SocketOption)?;
        let conn = Connection::new(stream, peer);
        conn.set_read_timeout(Some(self.recv_timeout))
            .map_err(SetupError::SocketOption)?;

        info!(%peer, "connection accepted");
        Ok(Some(conn))
    }

    /// Stops listening. Connections already accepted are unaffected.
    pub fn close(&mut self) {
        if self.listener.take().is_some() {
            debug!(local_addr = %self.local_addr, "tcp server closed");
        }
    }
}

/// Polls a non-blocking accept every [`ACCEPT_POLL_INTERVAL`] until a peer
/// arrives, `limit` elapses or `abandon` fires.
fn poll_accept(
    listener: &TcpListener,
    limit: Option<Duration>,
    abandon: &mut dyn FnMut() -> bool,
) -> Result<Option<(TcpStream, SocketAddr)>, SetupError> {
    listener
        .set_nonblocking(true)
        .map_err(SetupError::SocketOption)?;
    let deadline = limit.map(|limit| (Instant::now() + limit, limit));

    let result = loop {
        match listener.accept() {
            Ok(pair) => break Ok(Some(pair)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if abandon() {
                    break Ok(None);
                }
                if let Some((deadline, limit)) = deadline {
                    if Instant::now() >= deadline {
                        break Err(SetupError::AcceptTimeout(limit));
                    }
                }
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => break Err(SetupError::Accept(e)),
        }
    };

    listener
        .set_nonblocking(false)
        .map_err(SetupError::SocketOption)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecvOutcome, TcpClient};
    use std::thread;

    fn server() -> TcpServer {
        TcpServer::init("127.0.0.1", 0, Duration::from_millis(100)).unwrap()
    }

    #[test]
    fn binds_ephemeral_port() {
        let srv = server();
        assert_ne!(srv.local_addr().port(), 0);
        assert_eq!(srv.recv_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn invalid_address_is_rejected() {
        let err = TcpServer::init("not-an-ip", 0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, SetupError::InvalidAddress(_)));
    }

    #[test]
    fn port_in_use_is_bind_error() {
        let srv = server();
        let port = srv.local_addr().port();

        let err = TcpServer::init("127.0.0.1", port, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, SetupError::Bind { .. }));
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn accept_times_out_without_client() {
        let srv = server();
        let err = srv.accept(Some(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, SetupError::AcceptTimeout(_)));
    }

    #[test]
    fn accept_unless_gives_up_when_told() {
        let srv = server();
        let mut ticks = 0;
        let started = Instant::now();

        let outcome = srv
            .accept_unless(None, || {
                ticks += 1;
                ticks >= 3
            })
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(ticks, 3);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn accept_unless_still_accepts_a_waiting_peer() {
        let srv = server();
        let port = srv.local_addr().port();
        let client = thread::spawn(move || TcpClient::connect("127.0.0.1", port).unwrap());

        let conn = srv.accept_unless(Some(Duration::from_secs(5)), || false).unwrap();

        assert!(conn.is_some());
        client.join().unwrap();
    }

    #[test]
    fn accept_after_close_fails() {
        let mut srv = server();
        srv.close();
        assert!(matches!(srv.accept(None), Err(SetupError::Accept(_))));
    }

    #[test]
    fn receive_reports_data_timeout_and_close() {
        let srv = server();
        let port = srv.local_addr().port();

        let client = thread::spawn(move || {
            let mut conn = TcpClient::connect("127.0.0.1", port).unwrap();
            conn.send(b"hello").unwrap();
            thread::sleep(Duration::from_millis(300));
            conn.close().unwrap();
        });

        let mut conn = srv.accept(Some(Duration::from_secs(5))).unwrap();
        let mut buf = [0u8; 16];
        let mut received = Vec::new();
        let mut saw_timeout = false;

        loop {
            match conn.receive(&mut buf).unwrap() {
                RecvOutcome::Data(n) => received.extend_from_slice(&buf[..n]),
                RecvOutcome::TimedOut => saw_timeout = true,
                RecvOutcome::Closed => break,
            }
        }
        client.join().unwrap();

        assert_eq!(received, b"hello");
        assert!(saw_timeout, "a 100ms timeout must fire during a 300ms pause");
    }
}
