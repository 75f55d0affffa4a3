//! `sky metrics` - aggregate a metrics directory and print the document.

use anyhow::Context;
use skyhook_metrics::aggregate_metrics_dir;
use std::path::Path;

pub fn execute(metrics_dir: &Path, pretty: bool) -> anyhow::Result<()> {
    let document = aggregate_metrics_dir(metrics_dir)
        .with_context(|| format!("failed to aggregate {}", metrics_dir.display()))?;

    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        document.to_json()?
    };
    println!("{json}");
    Ok(())
}
