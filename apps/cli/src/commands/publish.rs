//! `sky publish` - run the full publishing pipeline.

use crate::config::{self, CliConfig, HubOverrides};
use crate::progress::BarProgressSink;
use anyhow::Context;
use colored::Colorize;
use skyhook_hub::{BlobTransfer, HubClient, NullProgressSink, ProgressSink};
use skyhook_publish::{
    cancel_pair, MetricsOutcome, PublishOptions, PublishReport, Publisher, RunOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn execute(
    artifact_dir: PathBuf,
    metrics_dir: Option<PathBuf>,
    overrides: HubOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let file_config = CliConfig::discover_and_load();
    let hub_config = config::resolve_hub_config(&file_config, &overrides)
        .context("incomplete hub configuration")?;

    let progress: Arc<dyn ProgressSink> =
        if json { Arc::new(NullProgressSink) } else { Arc::new(BarProgressSink::new()) };
    let client = HubClient::new(hub_config);
    let transfer = BlobTransfer::new().with_progress(progress);

    // Ctrl-C aborts the in-flight transfer and jumps to manifest submission
    // with whatever digests were collected.
    let (canceller, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupted - submitting partial manifest");
            canceller.cancel();
        }
    });

    let publisher = Publisher::new(client, transfer).with_cancel_token(token);
    let report = publisher.publish(&PublishOptions { artifact_dir, metrics_dir }).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    match report.outcome() {
        RunOutcome::Failed => anyhow::bail!("publish failed: manifest was not accepted"),
        _ => Ok(()),
    }
}

fn print_summary(report: &PublishReport) {
    println!();
    match &report.metrics {
        MetricsOutcome::Submitted { labels, series } => {
            println!("{} metrics submitted ({series} series, {labels} epochs)", "✓".green());
        }
        MetricsOutcome::Skipped => println!("{} metrics skipped (no directory given)", "-".dimmed()),
        MetricsOutcome::SkippedMissingDir => {
            println!("{} metrics skipped (directory missing)", "-".yellow());
        }
        MetricsOutcome::Failed { reason } => {
            println!("{} metrics failed: {reason}", "✗".red());
        }
    }

    for digest in &report.uploaded {
        println!("{} {} ({})", "✓".green(), digest.file_name, digest.md5_base64.dimmed());
    }
    for failure in &report.failures {
        println!("{} {} - {}", "✗".red(), failure.file_name, failure.reason);
    }
    if let Some(reason) = &report.denied {
        println!("{} upload denied by hub: {reason}", "✗".red());
    }
    if report.cancelled {
        println!("{} run cancelled before completion", "!".yellow());
    }

    println!();
    match &report.manifest {
        skyhook_publish::ManifestOutcome::Submitted { files } => {
            println!("manifest submitted ({files} files)");
        }
        skyhook_publish::ManifestOutcome::Failed { reason } => {
            println!("{} manifest submission failed: {reason}", "✗".red());
        }
    }

    let outcome = match report.outcome() {
        RunOutcome::Success => "success".green().to_string(),
        RunOutcome::Partial => "partial".yellow().to_string(),
        RunOutcome::Failed => "failed".red().to_string(),
    };
    println!("run {} finished: {outcome}", report.run_id);
}
