// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Runs one inference engine over a held-out sample set and
// scores it against the sample titles:
//
//   neural            span model extraction → embedding resolver
//   baseline          fuzzy HTML scan (extraction == resolution)
//   baseline-resolve  span model extraction → fuzzy resolver
//
// The canonical brand list comes from a file when given, otherwise
// from the unique titles of the evaluated samples. Any engine
// failure aborts the run; no partial table is written.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::data::{
    loader::{brands_from_samples, load_brand_list, load_samples},
    preprocessor::HtmlPreprocessor,
};
use crate::domain::brand::CanonicalBrandSet;
use crate::domain::record::{BrandMetrics, ResultTable};
use crate::domain::sample::Sample;
use crate::domain::traits::{BrandInferencer, BrandResolver};
use crate::eval::evaluator::{aggregate, low_performing, manage_result, run_inference};
use crate::infra::{
    checkpoint::CheckpointManager, embedder::load_embedder, tokenizer_store::HfQaTokenizer,
};
use crate::ml::{
    baseline::BaselineBrandInference,
    engine::NeuralBrandInference,
    inferencer::{BurnQaModel, InferBackend},
};
use crate::resolver::{embedding::EmbeddingResolver, fuzzy::FuzzyResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    Neural,
    Baseline,
    BaselineResolve,
}

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub samples:   PathBuf,
    pub brands:    Option<PathBuf>,
    /// Span model checkpoint directory (with tokenizer.json inside
    /// unless `tokenizer` is given)
    pub model_dir: Option<PathBuf>,
    pub tokenizer: Option<PathBuf>,
    pub mode:      EvalMode,
    pub output:    Option<PathBuf>,
    pub pipeline:  PipelineConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub total:          usize,
    pub correct:        usize,
    pub accuracy:       f64,
    pub per_brand:      Vec<BrandMetrics>,
    pub low_performing: Vec<BrandMetrics>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationSummary> {
        let cfg = &self.config;
        cfg.pipeline.validate()?;

        let samples = load_samples(&cfg.samples)?;
        let brands  = match &cfg.brands {
            Some(path) => load_brand_list(path)?,
            None => brands_from_samples(&samples)
                .context("Cannot derive a brand list from an empty sample set")?,
        };
        tracing::info!(
            "Evaluating {} samples against {} brands ({:?})",
            samples.len(),
            brands.len(),
            cfg.mode
        );

        let engine = self.build_engine(brands)?;
        self.run(engine.as_ref(), &samples)
    }

    /// Score `engine` on `samples`, save the table if configured and
    /// summarise the metrics.
    pub fn run(&self, engine: &dyn BrandInferencer, samples: &[Sample]) -> Result<EvaluationSummary> {
        let cfg   = &self.config;
        let table: ResultTable = run_inference(engine, samples)?;
        let correct = manage_result(&table, cfg.output.as_deref())?;

        let agg = aggregate(&table);
        let low = low_performing(
            &agg.per_brand,
            cfg.pipeline.triage_count_threshold,
            cfg.pipeline.triage_threshold,
        );

        Ok(EvaluationSummary {
            total:          table.len(),
            correct,
            accuracy:       agg.accuracy,
            per_brand:      agg.per_brand,
            low_performing: low,
        })
    }

    fn build_engine(&self, brands: CanonicalBrandSet) -> Result<Box<dyn BrandInferencer>> {
        let cfg = &self.config;
        let fuzzy = |brands: CanonicalBrandSet| {
            FuzzyResolver::new(
                brands,
                HtmlPreprocessor::new(cfg.pipeline.html_truncation_limit),
                cfg.pipeline.candidates_per_brand,
            )
        };

        match cfg.mode {
            EvalMode::Baseline => Ok(Box::new(BaselineBrandInference::new(fuzzy(brands)))),
            EvalMode::Neural => {
                let embedder = load_embedder()?;
                let resolver = EmbeddingResolver::new(embedder, brands, cfg.pipeline.resolution_threshold)?;
                self.neural_engine(resolver)
            }
            EvalMode::BaselineResolve => self.neural_engine(fuzzy(brands)),
        }
    }

    fn neural_engine<R>(&self, resolver: R) -> Result<Box<dyn BrandInferencer>>
    where
        R: BrandResolver + 'static,
    {
        let cfg = &self.config;
        let model_dir = cfg
            .model_dir
            .as_ref()
            .context("The neural modes need --model-dir")?;

        let model = BurnQaModel::<InferBackend>::from_checkpoint(
            &CheckpointManager::new(model_dir),
            Default::default(),
        )?;
        let max_length = cfg.pipeline.max_sequence_length.min(model.max_seq_len());
        let tok_path   = cfg.tokenizer.clone().unwrap_or_else(|| model_dir.clone());
        let tokenizer  = HfQaTokenizer::load(&tok_path, max_length, false)?;

        Ok(Box::new(NeuralBrandInference::new(
            tokenizer,
            model,
            resolver,
            cfg.pipeline.question.clone(),
        )))
    }
}
