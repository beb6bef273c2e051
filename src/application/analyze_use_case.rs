// ============================================================
// Layer 2 — AnalyzeUseCase
// ============================================================
// Re-analyses a saved result table without rerunning inference:
//
//   Step 1: Load the table (.csv or .jsonl)
//   Step 2: Accuracy and per-brand metrics
//   Step 3: Triage low-performing brands
//   Step 4: Optionally restrict metrics to chosen brands, or to
//           brands seen only at evaluation time
//   Step 5: Optionally save the metrics CSV
//   Step 6: Optionally export one correct and one incorrect page
//           of a brand for inspection

use anyhow::Result;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::data::{curation::only_eval_brands, loader::load_samples};
use crate::domain::record::{BrandMetrics, InferenceRecord};
use crate::eval::analyzer::{export_sample, ResultAnalyzer};

/// Train and eval sample files used to find brands the model never
/// (or barely) saw during training.
#[derive(Debug, Clone)]
pub struct UnseenBrandSources {
    pub train: PathBuf,
    pub eval:  PathBuf,
}

#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub results:     PathBuf,
    pub metrics_out: Option<PathBuf>,
    /// Restrict subset metrics to these ground-truth brands
    pub targets:     Vec<String>,
    pub unseen:      Option<UnseenBrandSources>,
    /// Brand whose samples are exported, and where to
    pub export:      Option<(String, PathBuf)>,
    pub pipeline:    PipelineConfig,
}

/// An exported sample and where its HTML was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedSample {
    pub record: InferenceRecord,
    pub path:   PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub rows:           usize,
    pub accuracy:       f64,
    pub metrics:        Vec<BrandMetrics>,
    pub low_performing: Vec<BrandMetrics>,
    pub subset_brands:  Vec<String>,
    pub subset_metrics: Option<Vec<BrandMetrics>>,
    pub exported:       Vec<ExportedSample>,
}

pub struct AnalyzeUseCase {
    config: AnalyzeConfig,
}

impl AnalyzeUseCase {
    pub fn new(config: AnalyzeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<AnalysisReport> {
        let cfg = &self.config;
        cfg.pipeline.validate()?;

        // ── Step 1: Load ──────────────────────────────────────────────────────
        let analyzer = ResultAnalyzer::load(&cfg.results)?;

        // ── Step 2: Metrics ───────────────────────────────────────────────────
        let accuracy = analyzer.accuracy();
        let metrics  = analyzer.metrics();

        // ── Step 3: Triage ────────────────────────────────────────────────────
        let low = analyzer.low_performing(
            cfg.pipeline.triage_count_threshold,
            cfg.pipeline.triage_threshold,
        );
        tracing::info!(
            "{} of {} brands flagged (count >= {}, score <= {:.2})",
            low.len(),
            metrics.len(),
            cfg.pipeline.triage_count_threshold,
            cfg.pipeline.triage_threshold
        );

        // ── Step 4: Subset metrics ────────────────────────────────────────────
        let mut subset_brands = cfg.targets.clone();
        if let Some(sources) = &cfg.unseen {
            let train = load_samples(&sources.train)?;
            let eval  = load_samples(&sources.eval)?;
            let only  = only_eval_brands(&train, &eval, cfg.pipeline.low_sample_percentage);
            tracing::info!("{} brands occur only at evaluation time", only.len());
            subset_brands.extend(only);
        }
        subset_brands.sort();
        subset_brands.dedup();

        let subset_metrics = if subset_brands.is_empty() {
            None
        } else {
            Some(analyzer.brands_metrics(&subset_brands))
        };

        // ── Step 5: Save metrics ──────────────────────────────────────────────
        if let Some(path) = &cfg.metrics_out {
            analyzer.save_metrics(path)?;
        }

        // ── Step 6: Export samples ────────────────────────────────────────────
        let mut exported = Vec::new();
        if let Some((brand, dir)) = &cfg.export {
            let slug: String = brand
                .chars()
                .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                .collect();
            let picks = [
                ("correct", analyzer.correct_samples(brand)),
                ("incorrect", analyzer.incorrect_samples(brand)),
            ];
            for (kind, rows) in picks {
                let Some(record) = rows.first() else {
                    tracing::warn!("No {} samples for '{}'", kind, brand);
                    continue;
                };
                let path = dir.join(format!("{slug}_{kind}_sample.txt"));
                export_sample(record, &path)?;
                exported.push(ExportedSample { record: (*record).clone(), path });
            }
        }

        Ok(AnalysisReport {
            rows: analyzer.table().len(),
            accuracy,
            metrics,
            low_performing: low,
            subset_brands,
            subset_metrics,
            exported,
        })
    }
}
