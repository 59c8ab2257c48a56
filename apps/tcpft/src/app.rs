//! Subcommand implementations.

use std::path::Path;
use std::thread;

use anyhow::{Context, bail};
use tcpft_transfer::{Receiver, TransferReport, receive_file, send_file};
use tracing::{info, info_span, warn};

use crate::compare::{Comparison, compare_files};
use crate::config::Config;

pub fn send(config: &Config, file: &Path) -> anyhow::Result<()> {
    let span = info_span!("send", addr = %config.address, port = config.port);
    let _entered = span.enter();

    let report = send_file(&config.address, config.port, file, config.transfer.clone())
        .with_context(|| format!("sending {}", file.display()))?;
    log_report("sent", &report);
    Ok(())
}

pub fn receive(config: &Config, file: &Path) -> anyhow::Result<()> {
    let span = info_span!("receive", addr = %config.address, port = config.port);
    let _entered = span.enter();

    let report = receive_file(&config.address, config.port, file, config.transfer.clone())
        .with_context(|| format!("receiving into {}", file.display()))?;
    log_report("received", &report);
    Ok(())
}

/// Runs a receiver and a sender against each other, then compares the
/// two files.
pub fn demo(config: &Config, input: &Path, output: &Path) -> anyhow::Result<()> {
    let mut receiver = Receiver::bind(&config.address, config.port, config.transfer.clone())
        .context("starting receiver")?
        .with_span(info_span!("demo-receiver"));
    let addr = receiver.local_addr();
    info!(%addr, input = %input.display(), output = %output.display(), "demo starting");

    let destination = output.to_path_buf();
    let receiving = thread::Builder::new()
        .name("tcpft-receiver".into())
        .spawn(move || {
            let result = receiver.receive(destination);
            receiver.close();
            result
        })
        .context("spawning receiver thread")?;

    let sent = info_span!("demo-sender").in_scope(|| {
        send_file(
            &addr.ip().to_string(),
            addr.port(),
            input,
            config.transfer.clone(),
        )
    });
    let received = receiving
        .join()
        .map_err(|_| anyhow::anyhow!("receiver thread panicked"))?;

    // Both sides are joined before either error is reported.
    let sent = sent.context("sending side failed")?;
    let received = received.context("receiving side failed")?;
    log_report("sent", &sent);
    log_report("received", &received);

    let cmp = compare_files(input, output)?;
    report_comparison(input, output, &cmp)
}

pub fn compare(a: &Path, b: &Path) -> anyhow::Result<()> {
    let cmp = compare_files(a, b)?;
    report_comparison(a, b, &cmp)
}

fn report_comparison(a: &Path, b: &Path, cmp: &Comparison) -> anyhow::Result<()> {
    if cmp.identical() {
        info!(bytes = cmp.len_a, sha256 = %cmp.sha256_a, "files are identical");
        println!("identical  {}  {} bytes", cmp.sha256_a, cmp.len_a);
        return Ok(());
    }

    warn!(
        a = %a.display(),
        b = %b.display(),
        len_a = cmp.len_a,
        len_b = cmp.len_b,
        offset = cmp.first_difference,
        "files differ"
    );
    println!("{}  {}  {} bytes", cmp.sha256_a, a.display(), cmp.len_a);
    println!("{}  {}  {} bytes", cmp.sha256_b, b.display(), cmp.len_b);
    bail!(
        "files differ at byte {}",
        cmp.first_difference.unwrap_or_default()
    )
}

fn log_report(what: &str, report: &TransferReport) {
    let secs = report.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        report.bytes as f64 / secs / 1024.0 / 1024.0
    } else {
        0.0
    };
    info!(
        bytes = report.bytes,
        chunks = report.chunks,
        elapsed_ms = report.elapsed.as_millis() as u64,
        mib_per_sec = rate,
        "{what}"
    );
}
