use anyhow::Result;

use crate::domain::traits::{BrandInference, BrandInferencer};
use crate::resolver::fuzzy::FuzzyResolver;

/// Non-neural comparison path: the fuzzy HTML scan both extracts and
/// resolves, so the raw extraction is the identified brand itself.
pub struct BaselineBrandInference {
    resolver: FuzzyResolver,
}

impl BaselineBrandInference {
    pub fn new(resolver: FuzzyResolver) -> Self {
        Self { resolver }
    }
}

impl BrandInferencer for BaselineBrandInference {
    fn infer(&self, context: &str) -> Result<BrandInference> {
        let resolution = self.resolver.resolve_from_html(context);
        Ok(BrandInference { raw_extraction: resolution.brand.clone(), resolution })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::HtmlPreprocessor;
    use crate::domain::brand::{CanonicalBrandSet, OTHER_BRAND};

    fn engine() -> BaselineBrandInference {
        let brands = CanonicalBrandSet::new(["PayPal", "DHL"]).unwrap();
        BaselineBrandInference::new(FuzzyResolver::new(brands, HtmlPreprocessor::default(), 3))
    }

    #[test]
    fn test_raw_extraction_equals_identified() {
        let out = engine().infer("<title>DHL Express tracking</title>").unwrap();
        assert_eq!(out.raw_extraction, "DHL");
        assert_eq!(out.resolution.brand, "DHL");
        assert!((out.resolution.similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_batch_keeps_order() {
        let out = engine()
            .infer_batch(&["<p>paypal</p>", "<p>dhl</p>", ""])
            .unwrap();
        let brands: Vec<&str> = out.iter().map(|o| o.resolution.brand.as_str()).collect();
        assert_eq!(brands, vec!["PayPal", "DHL", OTHER_BRAND]);
    }
}
