// ============================================================
// Layer 5 — ML / Inference Layer
// ============================================================
// All Burn framework code lives here; the rest of the crate sees
// the span model only through the QaModel trait.
//
//   model.rs      Transformer encoder with a start/end span head
//                 • token + position embeddings
//                 • multi-head self-attention with padding mask
//                 • GELU feed-forward, residuals, layer norm
//
//   inferencer.rs BurnQaModel: checkpoint loading and one forward
//                 pass per encoded (question, context) pair
//
//   engine.rs     NeuralBrandInference: arg-max span decoding
//                 followed by brand resolution
//
//   baseline.rs   BaselineBrandInference: fuzzy HTML scan, no model
//
// Reference: Burn Book §3 (Building Blocks)
//            Devlin et al. (2019) BERT

/// Transformer encoder span model architecture
pub mod model;

/// Burn-backed implementation of the QaModel trait
pub mod inferencer;

pub mod engine;
pub mod baseline;
