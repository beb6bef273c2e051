// ============================================================
// Layer 3 — Inference Records and Metrics
// ============================================================
// One InferenceRecord is produced per evaluated sample and the
// records are collected into a ResultTable, which is what gets
// persisted and re-analysed later. BrandMetrics are always derived
// from a ResultTable and never stored as a source of truth.
//
// On disk the record uses the column names
//   inference, identified, similarity, answer, correct, html
// with `correct` written as 0/1.

use serde::{Deserialize, Serialize};

/// The outcome of identifying the brand of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRecord {
    /// Unresolved text produced by the inference engine
    #[serde(rename = "inference")]
    pub raw_extraction: String,

    /// Canonical brand or a sentinel label
    #[serde(rename = "identified")]
    pub resolved_brand: String,

    #[serde(rename = "similarity")]
    pub resolution_similarity: f32,

    #[serde(rename = "answer")]
    pub ground_truth_brand: String,

    #[serde(rename = "correct", with = "bool_as_int")]
    pub is_correct: bool,

    #[serde(rename = "html")]
    pub source_context: String,
}

impl InferenceRecord {
    /// `is_correct` is derived, never passed in.
    pub fn new(
        raw_extraction:        impl Into<String>,
        resolved_brand:        impl Into<String>,
        resolution_similarity: f32,
        ground_truth_brand:    impl Into<String>,
        source_context:        impl Into<String>,
    ) -> Self {
        let resolved_brand     = resolved_brand.into();
        let ground_truth_brand = ground_truth_brand.into();
        let is_correct         = resolved_brand == ground_truth_brand;
        Self {
            raw_extraction: raw_extraction.into(),
            resolved_brand,
            resolution_similarity,
            ground_truth_brand,
            is_correct,
            source_context: source_context.into(),
        }
    }
}

/// All records of one evaluation pass, in sample order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<InferenceRecord>,
}

impl ResultTable {
    pub fn new(records: Vec<InferenceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[InferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn correct_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_correct).count()
    }

    /// Fraction of correct records; 0 for an empty table.
    pub fn accuracy(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.correct_count() as f64 / self.records.len() as f64
    }
}

impl FromIterator<InferenceRecord> for ResultTable {
    fn from_iter<I: IntoIterator<Item = InferenceRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Per-brand scores. `count` is the number of ground-truth occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandMetrics {
    pub brand:     String,
    pub count:     usize,
    pub recall:    f64,
    pub precision: f64,
    pub f1:        f64,
}

impl BrandMetrics {
    pub fn new(brand: impl Into<String>, count: usize, recall: f64, precision: f64) -> Self {
        Self {
            brand: brand.into(),
            count,
            recall,
            precision,
            f1: f1_score(precision, recall),
        }
    }
}

/// Harmonic mean; 0 when both inputs are 0.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    let denom = precision + recall;
    if denom > 0.0 {
        2.0 * precision * recall / denom
    } else {
        0.0
    }
}

mod bool_as_int {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match u8::deserialize(d)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::custom(format!("expected 0 or 1, got {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correctness_is_derived() {
        assert!(InferenceRecord::new("paypal", "PayPal", 0.9, "PayPal", "<html>").is_correct);
        assert!(!InferenceRecord::new("", "other", 0.0, "PayPal", "<html>").is_correct);
    }

    #[test]
    fn test_accuracy_of_empty_table_is_zero() {
        assert_eq!(ResultTable::default().accuracy(), 0.0);
    }

    #[test]
    fn test_f1_boundaries() {
        assert_eq!(f1_score(0.0, 0.0), 0.0);
        assert!((f1_score(1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((f1_score(1.0, 0.5) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_record_uses_table_column_names() {
        let r    = InferenceRecord::new("citi", "Citibank", 0.75, "Citibank", "<p>");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["inference"], "citi");
        assert_eq!(json["identified"], "Citibank");
        assert_eq!(json["answer"], "Citibank");
        assert_eq!(json["correct"], 1);
        assert_eq!(json["html"], "<p>");
    }

    #[test]
    fn test_correct_column_rejects_non_binary() {
        let bad = r#"{"inference":"","identified":"a","similarity":0.0,"answer":"a","correct":2,"html":""}"#;
        assert!(serde_json::from_str::<InferenceRecord>(bad).is_err());
    }
}
