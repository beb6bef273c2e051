use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::record::{BrandMetrics, InferenceRecord, ResultTable};
use crate::eval::evaluator::{low_performing, metrics_by_brand};
use crate::infra::metrics::save_metrics_csv;
use crate::infra::result_store::load_results;

/// Re-analysis of a saved result table, held fully in memory.
pub struct ResultAnalyzer {
    table: ResultTable,
}

impl ResultAnalyzer {
    pub fn new(table: ResultTable) -> Self {
        Self { table }
    }

    /// Load a `.csv` or `.jsonl` result table.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(load_results(path)?))
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn accuracy(&self) -> f64 {
        self.table.accuracy()
    }

    pub fn metrics(&self) -> Vec<BrandMetrics> {
        metrics_by_brand(self.table.records())
    }

    pub fn low_performing(&self, count_threshold: usize, score_threshold: f64) -> Vec<BrandMetrics> {
        low_performing(&self.metrics(), count_threshold, score_threshold)
    }

    pub fn incorrect_samples(&self, brand: &str) -> Vec<&InferenceRecord> {
        self.samples_for(brand, false)
    }

    pub fn correct_samples(&self, brand: &str) -> Vec<&InferenceRecord> {
        self.samples_for(brand, true)
    }

    fn samples_for(&self, brand: &str, correct: bool) -> Vec<&InferenceRecord> {
        self.table
            .records()
            .iter()
            .filter(|r| r.ground_truth_brand == brand && r.is_correct == correct)
            .collect()
    }

    /// Metrics over the rows whose ground truth is one of `targets`.
    pub fn brands_metrics(&self, targets: &[String]) -> Vec<BrandMetrics> {
        let rows: Vec<InferenceRecord> = self
            .table
            .records()
            .iter()
            .filter(|r| targets.contains(&r.ground_truth_brand))
            .cloned()
            .collect();
        metrics_by_brand(&rows)
    }

    pub fn save_metrics(&self, path: &Path) -> Result<Vec<BrandMetrics>> {
        let metrics = self.metrics();
        save_metrics_csv(path, &metrics)?;
        Ok(metrics)
    }
}

/// Write a record's HTML to `path` for manual inspection.
pub fn export_sample(record: &InferenceRecord, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    fs::write(path, &record.source_context)
        .with_context(|| format!("Cannot write sample to '{}'", path.display()))?;
    tracing::info!(
        "Exported sample (inference='{}', identified='{}') to '{}'",
        record.raw_extraction,
        record.resolved_brand,
        path.display()
    );
    Ok(())
}
