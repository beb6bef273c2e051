// ============================================================
// Layer 5 — Brand Resolution
// ============================================================
// Maps free text onto the canonical brand set.
//
//   EmbeddingResolver  sentence-embedding dot product, "unknown" below
//                      the resolution threshold
//   FuzzyResolver      character sequence ratio, "other" when nothing
//                      matches; also scans whole HTML pages

pub mod embedding;
pub mod fuzzy;
pub mod sequence_matcher;
pub mod similarity;
