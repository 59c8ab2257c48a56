//! TCP client (sending side).

use std::net::TcpStream;
use std::time::Duration;

use tracing::info;

use crate::connection::Connection;
use crate::error::SetupError;
use crate::socket_addr;

/// Opens the outgoing connection for a transfer.
pub struct TcpClient;

impl TcpClient {
    /// Connects to `addr:port`, waiting as long as the OS allows.
    pub fn connect(addr: &str, port: u16) -> Result<Connection, SetupError> {
        Self::connect_with(addr, port, None)
    }

    /// Connects to `addr:port`, giving up after `timeout` if one is set.
    pub fn connect_with(
        addr: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Connection, SetupError> {
        let addr = socket_addr(addr, port)?;
        let stream = match timeout.filter(|t| !t.is_zero()) {
            Some(limit) => TcpStream::connect_timeout(&addr, limit),
            None => TcpStream::connect(addr),
        }
        .map_err(|source| SetupError::Connect { addr, source })?;

        info!(%addr, "connected");
        Ok(Connection::new(stream, addr))
    }
}
