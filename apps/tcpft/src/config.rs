//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags.
//!
//! ```toml
//! address = "127.0.0.1"
//! port = 55055
//!
//! [transfer]
//! overflow = "block"
//! recv_timeout_ms = 1000
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tcpft_transfer::TransferConfig;

/// Well-known transfer port.
pub const DEFAULT_PORT: u16 = 55055;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// IPv4/IPv6 literal the receiver binds and the sender connects to.
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub transfer: TransferConfig,
}

fn default_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            transfer: TransferConfig::default(),
        }
    }
}

impl Config {
    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(address) = &overrides.address {
            self.address.clone_from(address);
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(overflow) = overrides.overflow {
            self.transfer.overflow = overflow;
        }
        if let Some(ms) = overrides.recv_timeout_ms {
            self.transfer.recv_timeout_ms = ms;
        }
        if let Some(ms) = overrides.accept_timeout_ms {
            self.transfer.accept_timeout_ms = ms;
        }
        if let Some(ms) = overrides.connect_timeout_ms {
            self.transfer.connect_timeout_ms = ms;
        }
        if let Some(reads) = overrides.max_idle_reads {
            self.transfer.max_idle_reads = reads;
        }
    }
}

/// Flag values that take precedence over the file.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct Overrides {
    /// Address to bind (receive) or connect to (send)
    #[arg(short, long, global = true)]
    pub address: Option<String>,

    /// TCP port
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Pool overflow policy: block or drop-oldest
    #[arg(long, global = true, value_parser = parse_overflow)]
    pub overflow: Option<tcpft_pool::OverflowPolicy>,

    /// Socket receive timeout in milliseconds
    #[arg(long, global = true)]
    pub recv_timeout_ms: Option<u64>,

    /// How long the receiver waits for a sender (0 = forever)
    #[arg(long, global = true)]
    pub accept_timeout_ms: Option<u64>,

    /// How long the sender waits for the connection (0 = OS default)
    #[arg(long, global = true)]
    pub connect_timeout_ms: Option<u64>,

    /// Consecutive receive timeouts before giving up (0 = unlimited)
    #[arg(long, global = true)]
    pub max_idle_reads: Option<u32>,
}

fn parse_overflow(value: &str) -> Result<tcpft_pool::OverflowPolicy, String> {
    match value {
        "block" => Ok(tcpft_pool::OverflowPolicy::Block),
        "drop-oldest" => Ok(tcpft_pool::OverflowPolicy::DropOldest),
        other => Err(format!("unknown overflow policy '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcpft_pool::OverflowPolicy;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 55055);
        assert_eq!(config.transfer, TransferConfig::default());
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            port = 6000

            [transfer]
            max_idle_reads = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 6000);
        assert_eq!(config.transfer.max_idle_reads, 10);
        assert_eq!(config.transfer.recv_timeout_ms, 1000);
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tcpft.toml");
        let written = Config {
            address: "::1".into(),
            port: 7000,
            transfer: TransferConfig {
                overflow: OverflowPolicy::DropOldest,
                ..TransferConfig::default()
            },
        };
        std::fs::write(&path, toml::to_string_pretty(&written).unwrap()).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), written);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&tmp.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = Config {
            port: 7000,
            ..Config::default()
        };
        config.apply(&Overrides {
            address: Some("10.0.0.2".into()),
            overflow: Some(OverflowPolicy::DropOldest),
            max_idle_reads: Some(5),
            ..Overrides::default()
        });

        assert_eq!(config.address, "10.0.0.2");
        assert_eq!(config.port, 7000);
        assert_eq!(config.transfer.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.transfer.max_idle_reads, 5);
        assert_eq!(config.transfer.recv_timeout_ms, 1000);
    }

    #[test]
    fn connect_timeout_flag_overrides_file() {
        let mut config: Config = toml::from_str(
            r#"
            [transfer]
            connect_timeout_ms = 3000
            "#,
        )
        .unwrap();
        config.apply(&Overrides {
            connect_timeout_ms: Some(250),
            ..Overrides::default()
        });

        assert_eq!(config.transfer.connect_timeout_ms, 250);
        assert_eq!(
            config.transfer.connect_timeout(),
            Some(std::time::Duration::from_millis(250))
        );
    }

    #[test]
    fn connect_timeout_flag_parses_from_command_line() {
        use clap::Parser;

        #[derive(Parser)]
        struct Args {
            #[command(flatten)]
            overrides: Overrides,
        }

        let args = Args::try_parse_from(["tcpft", "--connect-timeout-ms", "750"]).unwrap();
        assert_eq!(args.overrides.connect_timeout_ms, Some(750));
    }

    #[test]
    fn overflow_flag_parsing() {
        assert_eq!(parse_overflow("block"), Ok(OverflowPolicy::Block));
        assert_eq!(parse_overflow("drop-oldest"), Ok(OverflowPolicy::DropOldest));
        assert!(parse_overflow("newest").is_err());
    }
}
