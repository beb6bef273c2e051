// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `prepare`, `evaluate` and `analyze`.
//
// Every command accepts `--config <json>` for the pipeline
// thresholds; the most commonly tuned ones can also be overridden
// directly on the command line.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    analyze_use_case::{AnalyzeConfig, UnseenBrandSources},
    evaluate_use_case::{EvalMode, EvaluateConfig},
    prepare_use_case::PrepareConfig,
};
use crate::config::PipelineConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the extractive QA dataset from labelled phishing pages
    Prepare(PrepareArgs),

    /// Run an inference engine over held-out samples and score it
    Evaluate(EvaluateArgs),

    /// Re-analyse a saved result table
    Analyze(AnalyzeArgs),
}

/// Pipeline config file shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// JSON file with pipeline thresholds (defaults when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tokenizer max length
    #[arg(long)]
    pub max_seq_len: Option<usize>,
}

impl ConfigArgs {
    fn pipeline(&self) -> Result<PipelineConfig> {
        let mut cfg = PipelineConfig::load_or_default(self.config.as_deref())?;
        if let Some(len) = self.max_seq_len {
            cfg.max_sequence_length = len;
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// JSONL file of labelled phishing pages
    #[arg(long)]
    pub records: PathBuf,

    /// tokenizer.json, or a directory containing it
    #[arg(long)]
    pub tokenizer: PathBuf,

    #[arg(long, default_value = "data/qa")]
    pub out_dir: PathBuf,

    /// Shuffle seed; a random order is used when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Brand to leave out of the samples (repeatable)
    #[arg(long = "remove-brand")]
    pub remove: Vec<String>,

    /// Also write token-aligned answer spans
    #[arg(long)]
    pub align: bool,

    /// Minimum similarity for a page's brand tokens to be kept
    #[arg(long)]
    pub filter_threshold: Option<f32>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl PrepareArgs {
    pub fn into_config(self) -> Result<PrepareConfig> {
        let mut pipeline = self.config.pipeline()?;
        if let Some(t) = self.filter_threshold {
            pipeline.dataset_filter_threshold = t;
        }
        Ok(PrepareConfig {
            records:   self.records,
            tokenizer: self.tokenizer,
            out_dir:   self.out_dir,
            seed:      self.seed,
            remove:    self.remove,
            align:     self.align,
            pipeline,
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Span model extraction resolved by sentence embeddings
    Neural,
    /// Fuzzy scan of the page, no model
    Baseline,
    /// Span model extraction resolved by fuzzy matching
    BaselineResolve,
}

impl From<ModeArg> for EvalMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Neural          => EvalMode::Neural,
            ModeArg::Baseline        => EvalMode::Baseline,
            ModeArg::BaselineResolve => EvalMode::BaselineResolve,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// JSONL file of held-out samples
    #[arg(long)]
    pub samples: PathBuf,

    /// Canonical brand list (JSON array or one name per line);
    /// derived from the sample titles when omitted
    #[arg(long)]
    pub brands: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Neural)]
    pub mode: ModeArg,

    /// Span model checkpoint directory (model_config.json, latest_epoch.json
    /// and CompactRecorder weights); this tool does not train, so the
    /// checkpoint must come from external training tooling
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// tokenizer.json, or a directory containing it (defaults to --model-dir)
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// Result table to write (.csv or .jsonl)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Embedding resolver cut-off
    #[arg(long)]
    pub resolution_threshold: Option<f32>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl EvaluateArgs {
    pub fn into_config(self) -> Result<EvaluateConfig> {
        let mut pipeline = self.config.pipeline()?;
        if let Some(t) = self.resolution_threshold {
            pipeline.resolution_threshold = t;
        }
        Ok(EvaluateConfig {
            samples:   self.samples,
            brands:    self.brands,
            model_dir: self.model_dir,
            tokenizer: self.tokenizer,
            mode:      self.mode.into(),
            output:    self.output,
            pipeline,
        })
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Result table written by `evaluate` (.csv or .jsonl)
    #[arg(long)]
    pub results: PathBuf,

    /// Where to write the per-brand metrics CSV
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Brands triaged need at least this many samples
    #[arg(long)]
    pub count_threshold: Option<usize>,

    /// Brands triaged score at or below this on f1, precision or recall
    #[arg(long)]
    pub score_threshold: Option<f64>,

    /// Report metrics restricted to this brand (repeatable)
    #[arg(long = "brand")]
    pub targets: Vec<String>,

    /// Training samples; with --eval-samples, adds metrics for brands
    /// seen only at evaluation time
    #[arg(long, requires = "eval_samples")]
    pub train_samples: Option<PathBuf>,

    #[arg(long, requires = "train_samples")]
    pub eval_samples: Option<PathBuf>,

    /// Export one correct and one incorrect page of this brand
    #[arg(long)]
    pub export_brand: Option<String>,

    #[arg(long, default_value = "exports")]
    pub export_dir: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl AnalyzeArgs {
    pub fn into_config(self) -> Result<AnalyzeConfig> {
        let mut pipeline = self.config.pipeline()?;
        if let Some(c) = self.count_threshold {
            pipeline.triage_count_threshold = c;
        }
        if let Some(s) = self.score_threshold {
            pipeline.triage_threshold = s;
        }
        let unseen = match (self.train_samples, self.eval_samples) {
            (Some(train), Some(eval)) => Some(UnseenBrandSources { train, eval }),
            _ => None,
        };
        Ok(AnalyzeConfig {
            results:     self.results,
            metrics_out: self.metrics_out,
            targets:     self.targets,
            unseen,
            export:      self.export_brand.map(|b| (b, self.export_dir)),
            pipeline,
        })
    }
}
