// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Builds the extractive QA dataset from labelled phishing pages:
//
//   Step 1: Load PhishRecords (JSONL)           (Layer 4 - data)
//   Step 2: Shuffle (seedable)                  (rand)
//   Step 3: Locate each page's brand tokens     (Layer 4 - data)
//   Step 4: Drop low-similarity pages           (Layer 4 - data)
//   Step 5: Write the capped intermediate JSONL (Layer 4 - data)
//   Step 6: Build SQuAD-like samples, optionally
//           minus excluded brands               (Layer 4 - data)
//   Step 7: Save samples and the brand list
//   Step 8: Optionally align answer spans       (Layer 4 - data)
//
// Output directory:
//   qa_rows.jsonl   {context, answer_text, start_position, question}
//   samples.jsonl   Sample per line
//   brands.json     canonical brand list (unique, sorted)
//   aligned.jsonl   TokenizedSample per line (with --align)
//   pipeline.json   the PipelineConfig the dataset was built with

use anyhow::{Context, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::PipelineConfig;
use crate::data::{
    aligner::align_dataset,
    construction::{filter_by_similarity, jsonl_rows, to_samples, BrandTokenLocator},
    curation::remove_brands,
    loader::{load_phish_records, write_jsonl},
};
use crate::domain::brand::CanonicalBrandSet;
use crate::domain::sample::PhishRecord;
use crate::domain::traits::{Embedder, QaTokenizer};
use crate::infra::{embedder::load_embedder, tokenizer_store::HfQaTokenizer};

#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub records:   PathBuf,
    pub tokenizer: PathBuf,
    pub out_dir:   PathBuf,
    pub seed:      Option<u64>,
    /// Brands whose samples are left out of samples.jsonl
    pub remove:    Vec<String>,
    pub align:     bool,
    pub pipeline:  PipelineConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSummary {
    pub records_read:  usize,
    pub records_kept:  usize,
    pub jsonl_rows:    usize,
    pub samples:       usize,
    pub brands:        usize,
    pub aligned:       Option<usize>,
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Load the pretrained tokenizer and sentence embedder, then run.
    pub fn execute(&self) -> Result<PrepareSummary> {
        let cfg = &self.config;
        cfg.pipeline.validate()?;

        // Page-only encoding; pair padding is applied for aligned output.
        let tokenizer = HfQaTokenizer::load(&cfg.tokenizer, cfg.pipeline.max_sequence_length, true)?;
        let embedder  = load_embedder()?;
        self.run(&tokenizer, embedder.as_ref())
    }

    pub fn run(&self, tokenizer: &dyn QaTokenizer, embedder: &dyn Embedder) -> Result<PrepareSummary> {
        let cfg = &self.config;

        // ── Step 1: Load records ──────────────────────────────────────────────
        let mut records: Vec<PhishRecord> = load_phish_records(&cfg.records)?;
        let records_read = records.len();
        tracing::info!("Loaded {} phishing records from '{}'", records_read, cfg.records.display());

        // ── Step 2: Shuffle ───────────────────────────────────────────────────
        match cfg.seed {
            Some(seed) => records.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => records.shuffle(&mut rand::thread_rng()),
        }

        // ── Step 3: Locate brand tokens ───────────────────────────────────────
        let locator = BrandTokenLocator::new(tokenizer, embedder, cfg.pipeline.brand_window_tokens);
        let located = locator.locate_all(records)?;

        // ── Step 4: Similarity filter ─────────────────────────────────────────
        let kept = filter_by_similarity(located, cfg.pipeline.dataset_filter_threshold);
        let records_kept = kept.len();

        fs::create_dir_all(&cfg.out_dir)
            .with_context(|| format!("Cannot create '{}'", cfg.out_dir.display()))?;
        cfg.pipeline.save(&cfg.out_dir.join("pipeline.json"))?;

        // ── Step 5: Intermediate JSONL ────────────────────────────────────────
        let rows = jsonl_rows(&kept, &cfg.pipeline.question);
        let jsonl_written = write_jsonl(
            &cfg.out_dir.join("qa_rows.jsonl"),
            &rows,
            Some(cfg.pipeline.jsonl_sample_cap),
        )?;

        // ── Step 6: SQuAD-like samples ────────────────────────────────────────
        let mut samples = to_samples(&kept, &cfg.pipeline.question);
        if !cfg.remove.is_empty() {
            let before = samples.len();
            samples = remove_brands(&samples, &cfg.remove);
            tracing::info!("Removed {} samples of excluded brands", before - samples.len());
        }

        // ── Step 7: Persist samples and brand list ────────────────────────────
        write_jsonl(&cfg.out_dir.join("samples.jsonl"), &samples, None)?;
        let brands = save_brand_list(&cfg.out_dir.join("brands.json"), samples.iter().map(|s| s.title.clone()))?;

        // ── Step 8: Align answer spans ────────────────────────────────────────
        let aligned = if cfg.align {
            let tokenized = align_dataset(tokenizer, &samples)?;
            write_jsonl(&cfg.out_dir.join("aligned.jsonl"), &tokenized, None)?;
            Some(tokenized.len())
        } else {
            None
        };

        Ok(PrepareSummary {
            records_read,
            records_kept,
            jsonl_rows: jsonl_written,
            samples: samples.len(),
            brands,
            aligned,
        })
    }
}

/// Write the unique brands as a sorted JSON array; returns how many.
fn save_brand_list<I: IntoIterator<Item = String>>(path: &Path, names: I) -> Result<usize> {
    let names: Vec<String> = names.into_iter().collect();
    if names.is_empty() {
        tracing::warn!("No samples survived filtering; brand list is empty");
        fs::write(path, "[]")?;
        return Ok(0);
    }
    let set = CanonicalBrandSet::from_unordered(names)?;
    fs::write(path, serde_json::to_string_pretty(set.names())?)
        .with_context(|| format!("Cannot write brand list '{}'", path.display()))?;
    Ok(set.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TokenizedSample;
    use crate::data::loader::{load_brand_list, load_samples, read_jsonl};
    use crate::domain::traits::PairEncoding;

    const VOCAB: [&str; 9] = ["welcome", "to", "pay", "pal", "login", "dhl", "express", "track", "now"];

    /// Whitespace tokenizer over a fixed vocabulary, [CLS]=100 [SEP]=101.
    struct WordTokenizer;

    impl WordTokenizer {
        fn words(text: &str) -> Vec<(u32, usize, usize)> {
            let mut out = Vec::new();
            let mut pos = 0;
            for word in text.split(' ') {
                if let Some(id) = VOCAB.iter().position(|v| *v == word) {
                    out.push((id as u32, pos, pos + word.len()));
                }
                pos += word.len() + 1;
            }
            out
        }
    }

    impl QaTokenizer for WordTokenizer {
        fn encode_pair(&self, _q: &str, context: &str) -> Result<PairEncoding> {
            let mut enc = PairEncoding {
                input_ids:      vec![100, 101],
                attention_mask: vec![1, 1],
                offsets:        vec![(0, 0), (0, 0)],
                sequence_ids:   vec![None, None],
            };
            for (id, s, e) in Self::words(context) {
                enc.input_ids.push(id);
                enc.attention_mask.push(1);
                enc.offsets.push((s, e));
                enc.sequence_ids.push(Some(1));
            }
            enc.input_ids.push(101);
            enc.attention_mask.push(1);
            enc.offsets.push((0, 0));
            enc.sequence_ids.push(None);
            Ok(enc)
        }

        fn encode_text(&self, text: &str) -> Result<Vec<u32>> {
            Ok(Self::words(text).into_iter().map(|(id, _, _)| id).collect())
        }

        fn decode(&self, ids: &[u32]) -> Result<String> {
            Ok(ids
                .iter()
                .filter_map(|&i| VOCAB.get(i as usize).copied())
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    /// One axis per brand; a passage scores by the brand words it holds.
    struct BrandAxes;

    impl Embedder for BrandAxes {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    let paypal = ["pay", "pal"].iter().filter(|w| t.contains(*w)).count() as f32 * 0.5;
                    let dhl    = if t.contains("dhl") { 1.0 } else { 0.0 };
                    vec![paypal, dhl]
                })
                .collect())
        }
    }

    fn write_records(path: &Path) {
        let rows = [
            r#"{"html":"welcome to pay pal login","brand":"PayPal","host":"a","url":"u","label":1}"#,
            r#"{"html":"dhl express track now","brand":"DHL","host":"b","url":"u","label":1}"#,
            r#"{"html":"welcome login now","brand":"PayPal","host":"c","url":"u","label":1}"#,
        ];
        fs::write(path, rows.join("\n")).unwrap();
    }

    fn config(dir: &Path, remove: Vec<String>) -> PrepareConfig {
        PrepareConfig {
            records:   dir.join("records.jsonl"),
            tokenizer: dir.join("unused"),
            out_dir:   dir.join("out"),
            seed:      Some(7),
            remove,
            align:     true,
            pipeline:  PipelineConfig::default(),
        }
    }

    #[test]
    fn test_prepare_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_records(&dir.path().join("records.jsonl"));

        let summary = PrepareUseCase::new(config(dir.path(), vec![]))
            .run(&WordTokenizer, &BrandAxes)
            .unwrap();

        // The page without brand words scores 0 and is dropped.
        assert_eq!(summary.records_read, 3);
        assert_eq!(summary.records_kept, 2);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.brands, 2);
        assert_eq!(summary.aligned, Some(2));

        let out = dir.path().join("out");
        let samples = load_samples(&out.join("samples.jsonl")).unwrap();
        let paypal  = samples.iter().find(|s| s.title == "PayPal").unwrap();
        assert_eq!(paypal.answers.text, vec!["to pay pal".to_string()]);
        assert_eq!(paypal.answers.answer_start, vec![8]);

        let pipeline = PipelineConfig::load(&out.join("pipeline.json")).unwrap();
        assert_eq!(pipeline, PipelineConfig::default());

        let brands = load_brand_list(&out.join("brands.json")).unwrap();
        assert_eq!(brands.names(), &["DHL".to_string(), "PayPal".to_string()]);

        let aligned: Vec<TokenizedSample> = read_jsonl(&out.join("aligned.jsonl")).unwrap();
        assert!(aligned.iter().all(|s| s.has_answer()));
    }

    #[test]
    fn test_prepare_removes_brands() {
        let dir = tempfile::tempdir().unwrap();
        write_records(&dir.path().join("records.jsonl"));

        let summary = PrepareUseCase::new(config(dir.path(), vec!["DHL".to_string()]))
            .run(&WordTokenizer, &BrandAxes)
            .unwrap();
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.brands, 1);
        assert_eq!(summary.jsonl_rows, 2);
    }
}
