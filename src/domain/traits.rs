// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pretrained tokenizer, the QA model and the sentence
// embedder are black boxes. Each one is reached only through the
// traits below, and engines receive them as constructor arguments:
//
//   QaTokenizer  → HfQaTokenizer (tokenizers crate)
//   QaModel      → BurnQaModel   (burn transformer checkpoint)
//   Embedder     → FastEmbedder  (fastembed, optional feature)
//
// Resolvers and inference engines are traits too, so the neural
// path and the fuzzy baseline share one evaluation contract.

use anyhow::{ensure, Result};

// ─── Tokenizer ────────────────────────────────────────────────────────────────

/// A tokenized (question, context) pair.
///
/// `offsets[i]` is the character range of token `i` in its own
/// sequence; special and padding tokens carry `(0, 0)`.
/// `sequence_ids[i]` is `Some(0)` for question tokens, `Some(1)` for
/// context tokens and `None` for special/padding tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairEncoding {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub offsets:        Vec<(usize, usize)>,
    pub sequence_ids:   Vec<Option<usize>>,
}

impl PairEncoding {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Inclusive token range of the context segment, if any context
    /// token survived truncation.
    pub fn context_range(&self) -> Option<(usize, usize)> {
        let start = self.sequence_ids.iter().position(|s| *s == Some(1))?;
        let len = self.sequence_ids[start..]
            .iter()
            .take_while(|s| **s == Some(1))
            .count();
        Some((start, start + len - 1))
    }
}

pub trait QaTokenizer {
    /// Encode a pair, truncating only the context to the max length.
    fn encode_pair(&self, question: &str, context: &str) -> Result<PairEncoding>;

    /// Encode a single text (special tokens included), truncated to the
    /// max length.
    fn encode_text(&self, text: &str) -> Result<Vec<u32>>;

    /// Decode ids back to text, skipping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String>;
}

// ─── QA model ─────────────────────────────────────────────────────────────────

/// Per-token start/end scores for one encoded pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanLogits {
    pub start: Vec<f32>,
    pub end:   Vec<f32>,
}

pub trait QaModel {
    /// One synchronous forward pass. Logits have one entry per token.
    fn span_logits(&self, encoding: &PairEncoding) -> Result<SpanLogits>;
}

// ─── Embedder ─────────────────────────────────────────────────────────────────

pub trait Embedder {
    /// Embed every text; returns one fixed-length vector per input.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed(&[text.to_string()])?;
        ensure!(out.len() == 1, "Embedder returned {} vectors for 1 text", out.len());
        Ok(out.remove(0))
    }
}

// ─── Brand resolution and inference ───────────────────────────────────────────

/// A free-text string mapped onto the canonical brand set.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical brand or a sentinel label
    pub brand:      String,
    pub similarity: f32,
}

impl Resolution {
    pub fn new(brand: impl Into<String>, similarity: f32) -> Self {
        Self { brand: brand.into(), similarity }
    }
}

pub trait BrandResolver {
    fn resolve(&self, text: &str) -> Result<Resolution>;
}

/// Raw extraction plus its resolution for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandInference {
    pub raw_extraction: String,
    pub resolution:     Resolution,
}

pub trait BrandInferencer {
    fn infer(&self, context: &str) -> Result<BrandInference>;

    /// Samples are processed one after another; the first failure
    /// aborts the whole batch.
    fn infer_batch(&self, contexts: &[&str]) -> Result<Vec<BrandInference>> {
        contexts.iter().map(|c| self.infer(c)).collect()
    }
}

impl<T: QaTokenizer + ?Sized> QaTokenizer for Box<T> {
    fn encode_pair(&self, question: &str, context: &str) -> Result<PairEncoding> {
        (**self).encode_pair(question, context)
    }

    fn encode_text(&self, text: &str) -> Result<Vec<u32>> {
        (**self).encode_text(text)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        (**self).decode(ids)
    }
}

impl<M: QaModel + ?Sized> QaModel for Box<M> {
    fn span_logits(&self, encoding: &PairEncoding) -> Result<SpanLogits> {
        (**self).span_logits(encoding)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

impl<R: BrandResolver + ?Sized> BrandResolver for Box<R> {
    fn resolve(&self, text: &str) -> Result<Resolution> {
        (**self).resolve(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_range() {
        let enc = PairEncoding {
            input_ids:      vec![0; 7],
            attention_mask: vec![1; 7],
            offsets:        vec![(0, 0); 7],
            sequence_ids:   vec![None, Some(0), None, Some(1), Some(1), Some(1), None],
        };
        assert_eq!(enc.context_range(), Some((3, 5)));
    }

    #[test]
    fn test_context_range_missing() {
        let enc = PairEncoding {
            sequence_ids: vec![None, Some(0), None],
            ..Default::default()
        };
        assert_eq!(enc.context_range(), None);
    }

    struct CountingEmbedder;

    impl Embedder for CountingEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[test]
    fn test_embed_one_default() {
        assert_eq!(CountingEmbedder.embed_one("abcd").unwrap(), vec![4.0]);
    }
}
