// ============================================================
// Layer 4 — QA Dataset Construction
// ============================================================
// Turns labelled phishing pages into extractive QA samples by
// finding where the page spells out its brand.
//
// For every page:
//   1. Tokenize the HTML on its own (truncated to max length).
//   2. Slide a window of `window` tokens over the ids and decode
//      each window back to text (special tokens skipped).
//   3. Embed every window and the ground-truth brand; the window
//      with the highest dot product is the answer text.
//   4. Locate that text in the HTML (character index, 0 when the
//      decoded text does not occur verbatim).
//
// Pages whose best window scores at or below the filter threshold
// are dropped before samples are built.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::sample::{char_find, AnswerSpan, PhishRecord, Sample};
use crate::domain::traits::{Embedder, QaTokenizer};
use crate::resolver::similarity::best_match;

/// Where (and how confidently) a page names its brand.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandLocation {
    pub brand_tokens:   String,
    pub start_position: usize,
    pub similarity:     f32,
}

impl BrandLocation {
    fn not_found() -> Self {
        Self { brand_tokens: String::new(), start_position: 0, similarity: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatedRecord {
    pub record:   PhishRecord,
    pub location: BrandLocation,
}

/// One line of the intermediate JSONL sample file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaJsonlRow {
    pub context:        String,
    pub answer_text:    Vec<String>,
    pub start_position: Vec<usize>,
    pub question:       String,
}

pub struct BrandTokenLocator<'a, T: ?Sized, E: ?Sized> {
    tokenizer: &'a T,
    embedder:  &'a E,
    window:    usize,
}

impl<'a, T, E> BrandTokenLocator<'a, T, E>
where
    T: QaTokenizer + ?Sized,
    E: Embedder + ?Sized,
{
    pub fn new(tokenizer: &'a T, embedder: &'a E, window: usize) -> Self {
        Self { tokenizer, embedder, window: window.max(1) }
    }

    pub fn locate(&self, html: &str, brand: &str) -> Result<BrandLocation> {
        let ids = self.tokenizer.encode_text(html)?;
        if ids.len() < self.window {
            return Ok(BrandLocation::not_found());
        }

        let passages = ids
            .windows(self.window)
            .map(|w| self.tokenizer.decode(w))
            .collect::<Result<Vec<String>>>()?;

        let passage_embeddings = self.embedder.embed(&passages)?;
        ensure!(
            passage_embeddings.len() == passages.len(),
            "Embedder returned {} vectors for {} passages",
            passage_embeddings.len(),
            passages.len()
        );
        let query = self.embedder.embed_one(brand)?;

        let Some((idx, similarity)) = best_match(&query, &passage_embeddings) else {
            return Ok(BrandLocation::not_found());
        };
        let brand_tokens   = passages[idx].clone();
        let start_position = char_find(html, &brand_tokens).unwrap_or(0);

        Ok(BrandLocation { brand_tokens, start_position, similarity })
    }

    /// Locate the brand in every record, in order.
    pub fn locate_all(&self, records: Vec<PhishRecord>) -> Result<Vec<LocatedRecord>> {
        let total = records.len();
        let mut out = Vec::with_capacity(total);
        for (i, record) in records.into_iter().enumerate() {
            let location = self.locate(&record.html, &record.brand)?;
            tracing::debug!(
                "[{}/{}] {} → '{}' (sim={:.3}, start={})",
                i + 1,
                total,
                record.brand,
                location.brand_tokens,
                location.similarity,
                location.start_position
            );
            out.push(LocatedRecord { record, location });
        }
        Ok(out)
    }
}

/// Keep records whose similarity is strictly above `threshold`.
pub fn filter_by_similarity(records: Vec<LocatedRecord>, threshold: f32) -> Vec<LocatedRecord> {
    let before = records.len();
    let kept: Vec<LocatedRecord> = records
        .into_iter()
        .filter(|r| r.location.similarity > threshold)
        .collect();
    tracing::info!(
        "Kept {} of {} records above similarity {:.2}",
        kept.len(),
        before,
        threshold
    );
    kept
}

pub fn jsonl_rows(records: &[LocatedRecord], question: &str) -> Vec<QaJsonlRow> {
    records
        .iter()
        .map(|r| QaJsonlRow {
            context:        r.record.html.clone(),
            answer_text:    vec![r.location.brand_tokens.clone()],
            start_position: vec![r.location.start_position],
            question:       question.to_string(),
        })
        .collect()
}

/// SQuAD-like samples with fresh ids; the title is the ground-truth brand.
pub fn to_samples(records: &[LocatedRecord], question: &str) -> Vec<Sample> {
    records
        .iter()
        .map(|r| {
            Sample::new(
                r.record.html.clone(),
                question,
                AnswerSpan::new(r.location.start_position, r.location.brand_tokens.clone()),
                r.record.brand.clone(),
            )
        })
        .collect()
}
