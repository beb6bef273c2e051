use anyhow::{Context, Result};

use crate::domain::traits::{BrandInference, BrandInferencer, BrandResolver, QaModel, QaTokenizer};

/// Extracts a brand string with the span model, then resolves it.
///
/// The start and end indices are the arg-max of their logits taken
/// independently (first maximum wins). When the end lands before the
/// start the extraction is empty, and the resolver turns that into its
/// sentinel.
pub struct NeuralBrandInference<T, M, R> {
    tokenizer: T,
    model:     M,
    resolver:  R,
    question:  String,
}

impl<T, M, R> NeuralBrandInference<T, M, R>
where
    T: QaTokenizer,
    M: QaModel,
    R: BrandResolver,
{
    pub fn new(tokenizer: T, model: M, resolver: R, question: impl Into<String>) -> Self {
        Self { tokenizer, model, resolver, question: question.into() }
    }

    /// Raw answer text for one page, before resolution.
    pub fn extract(&self, context: &str) -> Result<String> {
        let encoding = self.tokenizer.encode_pair(&self.question, context)?;
        let logits   = self.model.span_logits(&encoding).context("Span model forward pass failed")?;

        let (Some(start), Some(end)) = (argmax(&logits.start), argmax(&logits.end)) else {
            return Ok(String::new());
        };
        if end < start || end >= encoding.len() {
            tracing::debug!("Degenerate span [{}, {}]", start, end);
            return Ok(String::new());
        }

        let answer = self.tokenizer.decode(&encoding.input_ids[start..=end])?;
        Ok(answer.trim().to_string())
    }
}

impl<T, M, R> BrandInferencer for NeuralBrandInference<T, M, R>
where
    T: QaTokenizer,
    M: QaModel,
    R: BrandResolver,
{
    fn infer(&self, context: &str) -> Result<BrandInference> {
        let raw_extraction = self.extract(context)?;
        let resolution     = self.resolver.resolve(&raw_extraction)?;
        tracing::debug!(
            "Extracted '{}' → '{}' ({:.3})",
            raw_extraction,
            resolution.brand,
            resolution.similarity
        );
        Ok(BrandInference { raw_extraction, resolution })
    }
}

/// Index of the first maximum; `None` for an empty slice.
fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::brand::UNKNOWN_BRAND;
    use crate::domain::traits::{PairEncoding, Resolution, SpanLogits};
    use anyhow::bail;

    /// `[CLS] q [SEP] w0 w1 ... [SEP]` over whitespace words.
    struct WordTokenizer;

    impl QaTokenizer for WordTokenizer {
        fn encode_pair(&self, _q: &str, context: &str) -> Result<PairEncoding> {
            let words: Vec<&str> = context.split_whitespace().collect();
            let mut ids = vec![0u32, 1, 0];
            ids.extend((0..words.len() as u32).map(|i| 100 + i));
            ids.push(0);
            let n = ids.len();
            Ok(PairEncoding {
                input_ids:      ids,
                attention_mask: vec![1; n],
                offsets:        vec![(0, 0); n],
                sequence_ids:   vec![None; n],
            })
        }

        fn encode_text(&self, _text: &str) -> Result<Vec<u32>> {
            Ok(Vec::new())
        }

        fn decode(&self, ids: &[u32]) -> Result<String> {
            Ok(ids
                .iter()
                .filter(|&&id| id >= 100)
                .map(|id| format!("w{}", id - 100))
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    /// Puts the start and end peaks at fixed token positions.
    struct FixedSpan {
        start: usize,
        end:   usize,
    }

    impl QaModel for FixedSpan {
        fn span_logits(&self, encoding: &PairEncoding) -> Result<SpanLogits> {
            let peak = |at: usize| -> Vec<f32> {
                (0..encoding.len()).map(|i| if i == at { 5.0 } else { 0.0 }).collect()
            };
            Ok(SpanLogits { start: peak(self.start), end: peak(self.end) })
        }
    }

    struct FailingModel;

    impl QaModel for FailingModel {
        fn span_logits(&self, _encoding: &PairEncoding) -> Result<SpanLogits> {
            bail!("device lost")
        }
    }

    /// Resolves "w1 w2" to a brand, anything else to the sentinel.
    struct TableResolver;

    impl BrandResolver for TableResolver {
        fn resolve(&self, text: &str) -> Result<Resolution> {
            Ok(match text {
                "w1 w2" => Resolution::new("PayPal", 0.9),
                _ => Resolution::new(UNKNOWN_BRAND, 0.0),
            })
        }
    }

    fn engine(start: usize, end: usize) -> NeuralBrandInference<WordTokenizer, FixedSpan, TableResolver> {
        NeuralBrandInference::new(WordTokenizer, FixedSpan { start, end }, TableResolver, "q")
    }

    #[test]
    fn test_decodes_inclusive_span_and_resolves() {
        // Tokens: [CLS] q [SEP] w0 w1 w2 w3 [SEP]
        let out = engine(4, 5).infer("a b c d").unwrap();
        assert_eq!(out.raw_extraction, "w1 w2");
        assert_eq!(out.resolution, Resolution::new("PayPal", 0.9));
    }

    #[test]
    fn test_end_before_start_is_empty_not_error() {
        let out = engine(5, 4).infer("a b c d").unwrap();
        assert_eq!(out.raw_extraction, "");
        assert_eq!(out.resolution.brand, UNKNOWN_BRAND);
    }

    #[test]
    fn test_model_failure_aborts_batch() {
        let engine = NeuralBrandInference::new(WordTokenizer, FailingModel, TableResolver, "q");
        assert!(engine.infer_batch(&["a b", "c d"]).is_err());
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
