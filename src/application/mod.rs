// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the lower layers into one workflow and
// returns a summary struct; printing stays in Layer 1.
//
//   prepare   labelled phishing pages → QA samples, brand list,
//             aligned token spans
//   evaluate  one inference engine over held-out samples → result
//             table and per-brand metrics
//   analyze   a saved result table → metrics, triage, exports

pub mod prepare_use_case;
pub mod evaluate_use_case;
pub mod analyze_use_case;
