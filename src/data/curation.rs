// ============================================================
// Layer 4 — Dataset Curation
// ============================================================
// Brand-level filters applied to QA datasets before training or
// before analysing brands that only occur at evaluation time.

use std::collections::{BTreeSet, HashMap};

use crate::domain::sample::Sample;

/// True when none of `remove` occurs inside the sample title.
pub fn filter_brands(sample: &Sample, remove: &[String]) -> bool {
    !remove.iter().any(|brand| sample.title.contains(brand.as_str()))
}

/// Samples whose title mentions none of `remove`.
pub fn remove_brands(samples: &[Sample], remove: &[String]) -> Vec<Sample> {
    samples
        .iter()
        .filter(|s| filter_brands(s, remove))
        .cloned()
        .collect()
}

/// The rarest brands that together hold just over `percentage`% of
/// the samples.
///
/// Brands are taken in ascending order of sample count (ties by
/// name); the brand whose count pushes the running total past the
/// target is still included.
pub fn low_sample_brands(samples: &[Sample], percentage: f64) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for s in samples {
        *counts.entry(s.title.as_str()).or_insert(0) += 1;
    }

    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let target          = samples.len() as f64 * (percentage / 100.0);
    let mut accumulated = 0usize;
    let mut out         = Vec::new();
    for (brand, count) in sorted {
        accumulated += count;
        out.push(brand.to_string());
        if accumulated as f64 > target {
            break;
        }
    }
    out
}

/// Brands seen in `eval` that the model effectively never trained on:
/// absent from `train`, or among its low-sample brands.
pub fn only_eval_brands(train: &[Sample], eval: &[Sample], percentage: f64) -> BTreeSet<String> {
    let low: BTreeSet<String> = low_sample_brands(train, percentage).into_iter().collect();
    let train_brands: BTreeSet<&str> = train
        .iter()
        .map(|s| s.title.as_str())
        .filter(|t| !low.contains(*t))
        .collect();

    eval.iter()
        .map(|s| s.title.as_str())
        .filter(|t| !train_brands.contains(t))
        .map(str::to_string)
        .collect()
}
