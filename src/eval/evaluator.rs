// ============================================================
// Layer 5 — Evaluation Engine
// ============================================================
// Scores identified brands against ground truth.
//
//   accuracy   correct records / all records
//   recall     per brand, grouped by ground truth ("answer")
//   precision  per brand, grouped by identified label
//   f1         harmonic mean, 0 when precision + recall == 0
//
// A label that only ever appears on one side (identified but never
// a ground truth, or the reverse) still gets a row, with the
// missing side counted as 0. Correctness is read from each
// record's `is_correct` flag, so reloaded tables score exactly as
// they were saved.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::record::{BrandMetrics, InferenceRecord, ResultTable};
use crate::domain::sample::Sample;
use crate::domain::traits::BrandInferencer;
use crate::infra::result_store::save_results;

/// One already-inferred sample awaiting scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationInput {
    pub ground_truth: String,
    pub resolved:     String,
    pub raw:          String,
    pub similarity:   f32,
    pub context:      String,
}

/// Accuracy plus per-brand metrics, sorted descending by count.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub accuracy:  f64,
    pub per_brand: Vec<BrandMetrics>,
}

pub fn evaluate<I>(inputs: I) -> ResultTable
where
    I: IntoIterator<Item = EvaluationInput>,
{
    inputs
        .into_iter()
        .map(|i| InferenceRecord::new(i.raw, i.resolved, i.similarity, i.ground_truth, i.context))
        .collect()
}

/// Run `engine` over every sample in order and score the results.
/// The first inference failure aborts the whole run.
pub fn run_inference<E: BrandInferencer + ?Sized>(engine: &E, samples: &[Sample]) -> Result<ResultTable> {
    let total = samples.len();
    let mut inputs = Vec::with_capacity(total);

    for (i, sample) in samples.iter().enumerate() {
        let inference = engine.infer(&sample.context)?;
        tracing::debug!(
            "[{}/{}] truth='{}' identified='{}' raw='{}'",
            i + 1,
            total,
            sample.title,
            inference.resolution.brand,
            inference.raw_extraction
        );
        inputs.push(EvaluationInput {
            ground_truth: sample.title.clone(),
            resolved:     inference.resolution.brand,
            raw:          inference.raw_extraction,
            similarity:   inference.resolution.similarity,
            context:      sample.context.clone(),
        });
    }

    let table = evaluate(inputs);
    tracing::info!(
        "Evaluated {} samples: {} correct ({:.4})",
        table.len(),
        table.correct_count(),
        table.accuracy()
    );
    Ok(table)
}

pub fn aggregate(table: &ResultTable) -> Aggregate {
    Aggregate {
        accuracy:  table.accuracy(),
        per_brand: metrics_by_brand(table.records()),
    }
}

#[derive(Default)]
struct Tally {
    truth_correct:      usize,
    truth_count:        usize,
    identified_correct: usize,
    identified_count:   usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-brand metrics over any subset of records, sorted descending by
/// count with ties broken by brand name.
pub fn metrics_by_brand(records: &[InferenceRecord]) -> Vec<BrandMetrics> {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    for r in records {
        let truth = tallies.entry(r.ground_truth_brand.as_str()).or_default();
        truth.truth_count   += 1;
        truth.truth_correct += usize::from(r.is_correct);

        let identified = tallies.entry(r.resolved_brand.as_str()).or_default();
        identified.identified_count   += 1;
        identified.identified_correct += usize::from(r.is_correct);
    }

    let mut metrics: Vec<BrandMetrics> = tallies
        .into_iter()
        .map(|(brand, t)| {
            BrandMetrics::new(
                brand,
                t.truth_count,
                ratio(t.truth_correct, t.truth_count),
                ratio(t.identified_correct, t.identified_count),
            )
        })
        .collect();

    // BTreeMap iteration is already name-ordered; a stable sort keeps it.
    metrics.sort_by(|a, b| b.count.cmp(&a.count));
    metrics
}

/// Brands seen at least `count_threshold` times with any of f1,
/// precision or recall at or below `score_threshold`, sorted
/// descending by count.
pub fn low_performing(
    metrics:         &[BrandMetrics],
    count_threshold: usize,
    score_threshold: f64,
) -> Vec<BrandMetrics> {
    let mut out: Vec<BrandMetrics> = metrics
        .iter()
        .filter(|m| m.count >= count_threshold)
        .filter(|m| {
            m.f1 <= score_threshold || m.precision <= score_threshold || m.recall <= score_threshold
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Number of correct identifications; the table is also written to
/// `save_path` when one is given.
pub fn manage_result(table: &ResultTable, save_path: Option<&Path>) -> Result<usize> {
    if let Some(path) = save_path {
        save_results(path, table)?;
    }
    Ok(table.correct_count())
}
