// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits that define what the system
// works with. No burn types, no file I/O, no model code.

// Raw pages, QA samples and answer spans
pub mod sample;

// Canonical brand set and sentinel labels
pub mod brand;

// Inference records, result tables and per-brand metrics
pub mod record;

// Tokenizer / model / embedder / resolver / engine abstractions
pub mod traits;
