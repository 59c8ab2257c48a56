//! Session tuning shared by both sides.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tcpft_pool::OverflowPolicy;

/// Knobs for a transfer session. Every field has a default, so a partial
/// TOML table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// What the pool does when the producer gets ahead of the consumer.
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Receive timeout on the accepted socket in milliseconds. Paces the
    /// receive loop while the peer is silent.
    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,

    /// How long to wait for the sender to connect (0 = forever).
    #[serde(default)]
    pub accept_timeout_ms: u64,

    /// How long the sender waits for the connection (0 = OS default).
    #[serde(default)]
    pub connect_timeout_ms: u64,

    /// Consecutive receive timeouts tolerated before giving up
    /// (0 = unlimited).
    #[serde(default)]
    pub max_idle_reads: u32,
}

fn default_recv_timeout_ms() -> u64 {
    tcpft_net::DEFAULT_RECV_TIMEOUT.as_millis() as u64
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::default(),
            recv_timeout_ms: default_recv_timeout_ms(),
            accept_timeout_ms: 0,
            connect_timeout_ms: 0,
            max_idle_reads: 0,
        }
    }
}

impl TransferConfig {
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }

    pub fn accept_timeout(&self) -> Option<Duration> {
        non_zero_ms(self.accept_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_ms(self.connect_timeout_ms)
    }
}

fn non_zero_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
