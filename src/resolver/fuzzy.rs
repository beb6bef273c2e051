use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

use crate::data::preprocessor::HtmlPreprocessor;
use crate::domain::brand::{CanonicalBrandSet, OTHER_BRAND};
use crate::domain::traits::{BrandResolver, Resolution};
use crate::resolver::sequence_matcher::{get_close_matches, ratio};

/// Baseline resolver: character sequence similarity only, no
/// embeddings.
///
/// `resolve` compares a free-text string against every brand
/// case-insensitively. `resolve_from_html` searches a whole page for
/// the brand name, using character n-grams to bound the work.
/// Both keep the first brand to reach the best score and fall back to
/// [`OTHER_BRAND`] with similarity 0 when nothing scores above 0.
pub struct FuzzyResolver {
    brands:       CanonicalBrandSet,
    preprocessor: HtmlPreprocessor,
    candidates:   usize,
}

impl FuzzyResolver {
    pub fn new(brands: CanonicalBrandSet, preprocessor: HtmlPreprocessor, candidates: usize) -> Self {
        Self { brands, preprocessor, candidates: candidates.max(1) }
    }

    /// Scan a raw page for the best-matching brand.
    pub fn resolve_from_html(&self, html: &str) -> Resolution {
        let page = self.preprocessor.clean(html).to_lowercase();
        let grams = char_ngrams(&page, self.brands.min_len(), self.brands.max_len());

        let mut best = Resolution::new(OTHER_BRAND, 0.0);
        let mut best_score = 0.0f64;

        for brand in self.brands.iter() {
            let Some(pool) = grams.get(&brand.chars().count()) else {
                continue;
            };
            // The page is lowercased, so both rankings use the lowercase brand.
            let lowered = brand.to_lowercase();
            for candidate in get_close_matches(&lowered, pool.iter().map(String::as_str), self.candidates, 0.0) {
                let score = ratio(candidate, &lowered);
                if score > best_score {
                    best_score = score;
                    best = Resolution::new(brand, score as f32);
                }
            }
        }

        tracing::trace!("Baseline match '{}' ({:.3})", best.brand, best.similarity);
        best
    }
}

impl BrandResolver for FuzzyResolver {
    fn resolve(&self, text: &str) -> Result<Resolution> {
        let text = text.to_lowercase();
        let mut best = Resolution::new(OTHER_BRAND, 0.0);
        let mut best_score = 0.0f64;

        for brand in self.brands.iter() {
            let score = ratio(&text, &brand.to_lowercase());
            if score > best_score {
                best_score = score;
                best = Resolution::new(brand, score as f32);
            }
        }
        Ok(best)
    }
}

/// Distinct character n-grams of `text` for every length in
/// `min..=max`. Lengths longer than the text get an empty set.
fn char_ngrams(text: &str, min: usize, max: usize) -> BTreeMap<usize, BTreeSet<String>> {
    let chars: Vec<char> = text.chars().collect();
    (min.max(1)..=max)
        .map(|n| {
            let set = if n > chars.len() {
                BTreeSet::new()
            } else {
                chars.windows(n).map(|w| w.iter().collect()).collect()
            };
            (n, set)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(brands: &[&str]) -> FuzzyResolver {
        let set = CanonicalBrandSet::new(brands.iter().copied()).unwrap();
        FuzzyResolver::new(set, HtmlPreprocessor::default(), 3)
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let r = resolver(&["Citibank", "Other Bank"]).resolve("citibank").unwrap();
        assert_eq!(r.brand, "Citibank");
        assert!((r.similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_without_overlap_is_other() {
        let r = resolver(&["abc"]).resolve("xyz").unwrap();
        assert_eq!(r, Resolution::new(OTHER_BRAND, 0.0));
    }

    #[test]
    fn test_resolve_empty_text_is_other() {
        let r = resolver(&["PayPal"]).resolve("").unwrap();
        assert_eq!(r, Resolution::new(OTHER_BRAND, 0.0));
    }

    #[test]
    fn test_resolve_ties_keep_first_brand() {
        // "ab" scores 0.8 against both "abc" and "abd".
        let r = resolver(&["abd", "abc"]).resolve("ab").unwrap();
        assert_eq!(r.brand, "abd");
    }

    #[test]
    fn test_html_scan_finds_brand_inside_markup() {
        let html = "<head><title>Sign in</title></head><body><p>Welcome to PayPal</p></body>";
        let r = resolver(&["PayPal", "DHL"]).resolve_from_html(html);
        assert_eq!(r.brand, "PayPal");
        assert!((r.similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_html_scan_finds_all_caps_brand() {
        let r = resolver(&["PayPal", "DHL"]).resolve_from_html("<title>DHL Express tracking</title>");
        assert_eq!(r.brand, "DHL");
        assert!((r.similarity - 1.0).abs() < 1e-6);

        let r = resolver(&["DHL"]).resolve_from_html("<p>Track your DHL parcel</p>");
        assert_eq!(r.brand, "DHL");
    }

    #[test]
    fn test_html_scan_tolerates_misspelled_brand() {
        let r = resolver(&["PayPal", "DHL"]).resolve_from_html("<p>Sign in to your paypa1 account</p>");
        assert_eq!(r.brand, "PayPal");
        // "paypa1" vs "paypal": 5 of 6 characters match.
        assert!((r.similarity - 5.0 / 6.0).abs() < 1e-6);
        assert!(r.similarity < 1.0);
    }

    #[test]
    fn test_html_scan_respects_truncation() {
        let set  = CanonicalBrandSet::new(["PayPal"]).unwrap();
        let res  = FuzzyResolver::new(set, HtmlPreprocessor::new(10), 3);
        let html = format!("{}paypal", "x".repeat(20));
        assert_eq!(res.resolve_from_html(&html), Resolution::new(OTHER_BRAND, 0.0));
    }

    #[test]
    fn test_html_shorter_than_every_brand_is_other() {
        let r = resolver(&["Microsoft"]).resolve_from_html("<p>ms</p>");
        assert_eq!(r, Resolution::new(OTHER_BRAND, 0.0));
    }

    #[test]
    fn test_char_ngrams_are_distinct() {
        let grams = char_ngrams("abab", 2, 3);
        assert_eq!(grams[&2].len(), 2);
        assert_eq!(grams[&3].len(), 2);
    }
}
