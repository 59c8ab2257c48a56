//! Blocking TCP transport for file streaming.
//!
//! One listener accepts one connection; one client connects to it. Bytes
//! are streamed raw: there is no framing, so message boundaries are not
//! preserved and only the total byte content matters.

pub mod client;
pub mod connection;
pub mod error;
pub mod server;

pub use client::TcpClient;
pub use connection::{Connection, RecvOutcome};
pub use error::SetupError;
pub use server::TcpServer;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Receive timeout applied to accepted connections.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// How often a timed accept re-checks the listener.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Parses a numeric IP address and port into a socket address.
///
/// Host names are not resolved.
pub fn socket_addr(addr: &str, port: u16) -> Result<SocketAddr, SetupError> {
    let ip: IpAddr = addr
        .trim()
        .parse()
        .map_err(|_| SetupError::InvalidAddress(addr.to_string()))?;
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_and_ipv6() {
        assert_eq!(
            socket_addr("127.0.0.1", 55055).unwrap(),
            "127.0.0.1:55055".parse().unwrap()
        );
        assert_eq!(socket_addr("::1", 80).unwrap(), "[::1]:80".parse().unwrap());
    }

    #[test]
    fn rejects_host_names_and_garbage() {
        for bad in ["localhost", "", "300.1.1.1", "127.0.0.1:80"] {
            let err = socket_addr(bad, 1).unwrap_err();
            assert!(matches!(err, SetupError::InvalidAddress(_)), "{bad}");
            assert_eq!(err.code(), -4);
        }
    }
}
