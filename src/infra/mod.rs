// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concrete collaborators behind the domain traits, plus file
// formats shared by several use cases:
//
//   tokenizer_store.rs — HfQaTokenizer over a pretrained
//                        tokenizer.json (tokenizers crate)
//
//   checkpoint.rs      — span model config + CompactRecorder
//                        weights (burn)
//
//   embedder.rs        — FastEmbedder, all-MiniLM-L6-v2
//                        (fastembed, optional feature)
//
//   result_store.rs    — ResultTable as .csv or .jsonl
//
//   metrics.rs         — per-brand metrics CSV artifact
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Span model checkpoint loading and saving
pub mod checkpoint;

/// Pretrained tokenizer adapter
pub mod tokenizer_store;

/// Sentence embedder
pub mod embedder;

/// Evaluation result table persistence
pub mod result_store;

/// Per-brand metrics CSV
pub mod metrics;
