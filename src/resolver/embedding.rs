use anyhow::{ensure, Context, Result};

use crate::domain::brand::{CanonicalBrandSet, UNKNOWN_BRAND};
use crate::domain::traits::{BrandResolver, Embedder, Resolution};
use crate::resolver::similarity::best_match;

/// Maps free text onto the canonical brand with the highest dot
/// product between sentence embeddings.
///
/// Brand embeddings are computed once, at construction. A best score
/// below the threshold resolves to [`UNKNOWN_BRAND`] while still
/// reporting the score.
pub struct EmbeddingResolver<E> {
    embedder:         E,
    brands:           CanonicalBrandSet,
    brand_embeddings: Vec<Vec<f32>>,
    threshold:        f32,
}

impl<E: Embedder> EmbeddingResolver<E> {
    pub fn new(embedder: E, brands: CanonicalBrandSet, threshold: f32) -> Result<Self> {
        let names: Vec<String> = brands.names().to_vec();
        let brand_embeddings = embedder
            .embed(&names)
            .context("Failed to embed the canonical brand list")?;

        ensure!(
            brand_embeddings.len() == names.len(),
            "Embedder returned {} vectors for {} brands",
            brand_embeddings.len(),
            names.len()
        );
        if let Some(dim) = brand_embeddings.first().map(Vec::len) {
            ensure!(
                brand_embeddings.iter().all(|v| v.len() == dim),
                "Brand embeddings have inconsistent dimensions"
            );
        }

        tracing::info!(
            "Embedded {} canonical brands (threshold {:.2})",
            names.len(),
            threshold
        );
        Ok(Self { embedder, brands, brand_embeddings, threshold })
    }
}

impl<E: Embedder> BrandResolver for EmbeddingResolver<E> {
    fn resolve(&self, text: &str) -> Result<Resolution> {
        if text.trim().is_empty() {
            return Ok(Resolution::new(UNKNOWN_BRAND, 0.0));
        }

        let query = self.embedder.embed_one(text)?;
        let Some((idx, similarity)) = best_match(&query, &self.brand_embeddings) else {
            return Ok(Resolution::new(UNKNOWN_BRAND, 0.0));
        };

        if similarity < self.threshold {
            return Ok(Resolution::new(UNKNOWN_BRAND, similarity));
        }
        let brand = self.brands.get(idx).unwrap_or(UNKNOWN_BRAND);
        Ok(Resolution::new(brand, similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Embeds a text by the brand keywords it contains.
    struct KeywordEmbedder {
        calls: Cell<usize>,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl Embedder for KeywordEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.set(self.calls.get() + 1);
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    let paypal = if t.contains("paypal") { 1.0 } else { 0.0 };
                    let dhl    = if t.contains("dhl") { 1.0 } else if t.contains("parcel") { 0.3 } else { 0.0 };
                    vec![paypal, dhl]
                })
                .collect())
        }
    }

    fn resolver() -> EmbeddingResolver<KeywordEmbedder> {
        let brands = CanonicalBrandSet::new(["PayPal", "DHL"]).unwrap();
        EmbeddingResolver::new(KeywordEmbedder::new(), brands, 0.5).unwrap()
    }

    #[test]
    fn test_resolves_to_best_brand() {
        let r = resolver().resolve("PayPal Inc.").unwrap();
        assert_eq!(r, Resolution::new("PayPal", 1.0));
    }

    #[test]
    fn test_below_threshold_is_unknown_with_score() {
        let r = resolver().resolve("parcel service").unwrap();
        assert_eq!(r.brand, UNKNOWN_BRAND);
        assert!((r.similarity - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_empty_text_is_unknown() {
        let res = resolver();
        let before = res.embedder.calls.get();
        assert_eq!(res.resolve("   ").unwrap(), Resolution::new(UNKNOWN_BRAND, 0.0));
        assert_eq!(res.embedder.calls.get(), before);
    }

    #[test]
    fn test_ties_go_to_first_listed_brand() {
        let r = resolver().resolve("paypal and dhl").unwrap();
        assert_eq!(r.brand, "PayPal");
    }

    #[test]
    fn test_brands_embedded_once() {
        let res = resolver();
        assert_eq!(res.embedder.calls.get(), 1);
        res.resolve("dhl").unwrap();
        res.resolve("paypal").unwrap();
        assert_eq!(res.embedder.calls.get(), 3);
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
    }

    #[test]
    fn test_mismatched_embedding_count_is_rejected() {
        let brands = CanonicalBrandSet::new(["PayPal", "DHL"]).unwrap();
        assert!(EmbeddingResolver::new(ShortEmbedder, brands, 0.5).is_err());
    }
}
