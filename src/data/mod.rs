// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between labelled phishing pages on disk and
// token-aligned QA samples:
//
//   PhishRecord JSONL
//       │
//       ▼
//   loader          → JSONL / brand list reading and writing
//       │
//       ▼
//   construction    → locate each page's brand tokens, filter by
//       │             similarity, build SQuAD-like samples
//       ▼
//   curation        → drop excluded or low-sample brands
//       │
//       ▼
//   aligner         → char answer span → token start/end
//       │
//       ▼
//   dataset         → TokenizedSample rows (aligned.jsonl)
//
// The fuzzy baseline reads pages through `preprocessor` instead.

/// JSONL records, samples and brand lists
pub mod loader;

/// Tag stripping and truncation of raw HTML
pub mod preprocessor;

pub mod construction;
pub mod curation;

/// Character span → token span alignment
pub mod aligner;

pub mod dataset;
