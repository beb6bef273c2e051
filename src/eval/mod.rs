// ============================================================
// Layer 5 — Evaluation & Analysis
// ============================================================
//   evaluator.rs — ResultTable construction, accuracy, per-brand
//                  recall / precision / F1, low-performer triage
//   analyzer.rs  — re-analysis of a persisted ResultTable

pub mod evaluator;
pub mod analyzer;
