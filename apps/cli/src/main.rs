//! Skyhook CLI - publish experiment artifacts and metrics to the hub.
//!
//! This CLI provides a `sky` command for pushing a finished training run's
//! outputs (checkpoints, weights, metric logs) to the Skyhook platform.

mod commands;
mod config;
mod progress;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Skyhook CLI - experiment artifact publishing
///
/// Skyhook (sky) uploads training artifacts to blob storage through the hub
/// broker API, submits aggregated metrics, and closes each run with a
/// content-hash manifest the hub uses to verify integrity.
#[derive(Parser, Debug)]
#[command(
    name = "sky",
    author,
    version,
    about = "Skyhook - experiment artifact publishing",
    long_about = "Skyhook (sky) publishes experiment outputs to the hub.\nArtifacts stream to blob storage through per-file upload slots; metrics logs\nare aggregated into one time-series document; a final MD5 manifest lets the\nhub verify every byte that landed."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a run's artifacts and metrics to the hub
    ///
    /// Walks the artifact directory recursively, negotiates an upload slot
    /// per file, streams each file to blob storage, and submits the digest
    /// manifest. Metrics are submitted first when a metrics directory is
    /// given; a missing metrics directory is not an error.
    Publish {
        /// Directory of artifact files to upload (walked recursively)
        artifact_dir: PathBuf,

        /// Directory of per-metric log files (optional)
        #[arg(long)]
        metrics_dir: Option<PathBuf>,

        /// Experiment name (overrides SKYHOOK_EXPERIMENT)
        #[arg(long)]
        experiment: Option<String>,

        /// Model name (overrides SKYHOOK_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Pipeline tag (overrides SKYHOOK_PIPELINE)
        #[arg(long)]
        pipeline: Option<String>,

        /// Hub base URL (overrides SKYHOOK_API_URL)
        #[arg(long)]
        api_url: Option<String>,

        /// Print the run report as JSON instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Aggregate a metrics directory and print the document without submitting
    ///
    /// Useful to inspect exactly what `publish` would send to the hub.
    Metrics {
        /// Directory of per-metric log files
        metrics_dir: PathBuf,

        /// Pretty-print the JSON document
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Publish { artifact_dir, metrics_dir, experiment, model, pipeline, api_url, json } => {
            let overrides = config::HubOverrides { experiment, model, pipeline, api_url };
            commands::publish::execute(artifact_dir, metrics_dir, overrides, json).await?;
        }
        Command::Metrics { metrics_dir, pretty } => {
            commands::metrics::execute(&metrics_dir, pretty)?;
        }
    }

    Ok(())
}
