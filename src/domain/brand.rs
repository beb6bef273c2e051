// ============================================================
// Layer 3 — Canonical Brands
// ============================================================
// The set of brand names a run may output, plus the two reserved
// sentinel labels used when nothing can be attributed.
//
// Order matters: it is the tie-break order for every arg-max over
// brands, so the same list always yields the same results.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Returned by the fuzzy resolver when no brand scores above zero.
pub const OTHER_BRAND: &str = "other";

/// Returned by the embedding resolver below its similarity threshold.
pub const UNKNOWN_BRAND: &str = "unknown";

/// An ordered set of unique brand names, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalBrandSet {
    names: Vec<String>,
}

impl CanonicalBrandSet {
    /// Build from names in the given order. Blank or repeated names
    /// are rejected.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen  = HashSet::new();
        let mut uniq  = Vec::new();
        for name in names {
            let name = name.into();
            ensure!(!name.trim().is_empty(), "Brand names must not be blank");
            ensure!(seen.insert(name.clone()), "Duplicate brand name '{name}'");
            uniq.push(name);
        }
        ensure!(!uniq.is_empty(), "Canonical brand set must not be empty");
        Ok(Self { names: uniq })
    }

    /// Build from an unordered collection such as dataset titles:
    /// sorted so tie-breaks are stable, repeats collapsed, blanks
    /// skipped.
    pub fn from_unordered<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all: Vec<String> = names.into_iter().map(Into::into).collect();
        let total = all.len();
        all.retain(|n| !n.trim().is_empty());
        if all.len() < total {
            tracing::warn!("Skipped {} blank brand names", total - all.len());
        }
        all.sort();
        all.dedup();
        Self::new(all)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Shortest brand name in characters
    pub fn min_len(&self) -> usize {
        self.names.iter().map(|n| n.chars().count()).min().unwrap_or(0)
    }

    /// Longest brand name in characters
    pub fn max_len(&self) -> usize {
        self.names.iter().map(|n| n.chars().count()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_given_order() {
        let set = CanonicalBrandSet::new(["PayPal", "Citibank"]).unwrap();
        assert_eq!(set.names(), &["PayPal".to_string(), "Citibank".to_string()]);
    }

    #[test]
    fn test_duplicate_and_blank_names_are_rejected() {
        let err = CanonicalBrandSet::new(["PayPal", "Citibank", "PayPal"]).unwrap_err();
        assert!(err.to_string().contains("Duplicate brand name 'PayPal'"));
        assert!(CanonicalBrandSet::new(["PayPal", " "]).is_err());
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(CanonicalBrandSet::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_from_unordered_sorts() {
        let set = CanonicalBrandSet::from_unordered(["b", "a", "", "c", "a"]).unwrap();
        assert_eq!(set.get(0), Some("a"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_length_bounds_use_chars() {
        let set = CanonicalBrandSet::new(["Crédit", "DHL"]).unwrap();
        assert_eq!(set.min_len(), 3);
        assert_eq!(set.max_len(), 6);
    }
}
