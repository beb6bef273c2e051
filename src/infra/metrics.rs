// ============================================================
// Layer 6 — Metrics Artifact
// ============================================================
// Writes the per-brand metrics table to CSV for plotting and
// reporting outside this crate.
//
// Columns, one row per brand, sorted descending by count:
//   brand,count,recall,precision,f1
//
// Example:
//   brand,count,recall,precision,f1
//   PayPal,412,0.95,0.97,0.96
//   DHL,130,0.81,0.9,0.85
//   unknown,0,0.0,0.0,0.0

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::record::BrandMetrics;

pub fn save_metrics_csv(path: &Path, metrics: &[BrandMetrics]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create metrics file '{}'", path.display()))?;
    for row in metrics {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!("Saved metrics for {} brands to '{}'", metrics.len(), path.display());
    Ok(())
}
