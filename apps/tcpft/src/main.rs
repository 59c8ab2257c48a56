//! tcpft entry point.

mod app;
mod compare;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Send one file over TCP, receive it, or check that two files match.
#[derive(Parser)]
#[command(name = "tcpft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    overrides: config::Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a receiver and stream a file to it
    Send {
        /// File to send
        file: PathBuf,
    },

    /// Listen for one sender and write what it streams into a file
    Receive {
        /// Destination file (created or truncated)
        file: PathBuf,
    },

    /// Run a sender and a receiver over loopback, then compare the files
    Demo {
        /// File to send
        input: PathBuf,
        /// Where the received copy is written
        output: PathBuf,
    },

    /// Compare two files byte for byte
    Compare { a: PathBuf, b: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_thread_names(true)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting tcpft");

    let mut config = config::Config::load(cli.config.as_deref())?;
    config.apply(&cli.overrides);

    let result = match &cli.command {
        Commands::Send { file } => app::send(&config, file),
        Commands::Receive { file } => app::receive(&config, file),
        Commands::Demo { input, output } => app::demo(&config, input, output),
        Commands::Compare { a, b } => app::compare(a, b),
    };

    if let Err(e) = &result {
        let chain = format!("{e:#}");
        tracing::error!(error = %chain, "tcpft failed");
    }
    result
}
