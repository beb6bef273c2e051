// ============================================================
// Pipeline Configuration
// ============================================================
// Every threshold and size limit used across the pipeline lives
// here, so a run can be reproduced from one JSON file.
//
//   resolution_threshold      0.5   embedding resolver cut-off
//   dataset_filter_threshold  0.7   dataset construction cut-off
//   triage_threshold          0.8   low-performing brand cut-off
//   html_truncation_limit     4000  chars kept by the fuzzy baseline
//   max_sequence_length       384   tokenizer max length
//
// Missing fields in a config file fall back to these defaults.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// The fixed question asked of every page.
pub const BRAND_QUESTION: &str = "What is the name of the website's brand?";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum dot-product similarity for the embedding resolver to
    /// attribute an extraction to a real brand
    pub resolution_threshold: f32,

    /// Samples whose located brand tokens score at or below this are
    /// dropped while building the QA dataset
    pub dataset_filter_threshold: f32,

    /// A brand is flagged for triage when f1, precision or recall is
    /// at or below this
    pub triage_threshold: f64,

    /// Brands need at least this many ground-truth samples to be triaged
    pub triage_count_threshold: usize,

    /// Characters of tag-stripped HTML scanned by the fuzzy baseline
    pub html_truncation_limit: usize,

    /// Tokenizer max length; the context is truncated, never the question
    pub max_sequence_length: usize,

    pub question: String,

    /// Lines written to the intermediate JSONL sample file
    pub jsonl_sample_cap: usize,

    /// Approximate-match candidates scored per brand by the fuzzy baseline
    pub candidates_per_brand: usize,

    /// Width of the token window slid over the HTML during dataset construction
    pub brand_window_tokens: usize,

    /// Share of training samples (in percent) treated as low-sample brands
    pub low_sample_percentage: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolution_threshold:     0.5,
            dataset_filter_threshold: 0.7,
            triage_threshold:         0.8,
            triage_count_threshold:   10,
            html_truncation_limit:    4000,
            max_sequence_length:      384,
            question:                 BRAND_QUESTION.to_string(),
            jsonl_sample_cap:         10_000,
            candidates_per_brand:     3,
            brand_window_tokens:      3,
            low_sample_percentage:    10.0,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse config '{}'", path.display()))?;
        cfg.validate()?;
        tracing::debug!("Loaded pipeline config from '{}'", path.display());
        Ok(cfg)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("resolution_threshold", self.resolution_threshold),
            ("dataset_filter_threshold", self.dataset_filter_threshold),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "{name} must be within [0, 1], got {value}"
            );
        }
        ensure!(
            (0.0..=1.0).contains(&self.triage_threshold),
            "triage_threshold must be within [0, 1], got {}",
            self.triage_threshold
        );
        ensure!(self.max_sequence_length > 0, "max_sequence_length must be positive");
        ensure!(self.html_truncation_limit > 0, "html_truncation_limit must be positive");
        ensure!(self.brand_window_tokens > 0, "brand_window_tokens must be positive");
        ensure!(self.candidates_per_brand > 0, "candidates_per_brand must be positive");
        ensure!(
            (0.0..=100.0).contains(&self.low_sample_percentage),
            "low_sample_percentage must be within [0, 100], got {}",
            self.low_sample_percentage
        );
        ensure!(!self.question.trim().is_empty(), "question must not be empty");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_sequence_length, 384);
        assert_eq!(cfg.html_truncation_limit, 4000);
        assert_eq!(cfg.question, BRAND_QUESTION);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"resolution_threshold": 0.6}"#).unwrap();

        let cfg = PipelineConfig::load(&path).unwrap();
        assert!((cfg.resolution_threshold - 0.6).abs() < 1e-6);
        assert!((cfg.dataset_filter_threshold - 0.7).abs() < 1e-6);
        assert_eq!(cfg.jsonl_sample_cap, 10_000);
    }

    #[test]
    fn test_save_then_load() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let cfg  = PipelineConfig { triage_count_threshold: 3, ..Default::default() };
        cfg.save(&path).unwrap();
        assert_eq!(PipelineConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let cfg = PipelineConfig { triage_threshold: 1.5, ..Default::default() };
        assert!(cfg.validate().is_err());

        let cfg = PipelineConfig { max_sequence_length: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
