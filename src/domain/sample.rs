// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// The records that flow through dataset preparation:
//
//   PhishRecord  raw labelled page  {html, brand, host, url, label}
//   Sample       SQuAD-style QA sample built from a PhishRecord
//   AnswerSpan   character-level answer inside Sample.context
//
// Character positions are Unicode scalar offsets (not bytes),
// matching the offsets reported by the tokenizer.

use serde::{Deserialize, Serialize};

/// One labelled phishing page as it arrives from the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhishRecord {
    pub html:  String,
    pub brand: String,
    #[serde(default)]
    pub host:  String,
    #[serde(default)]
    pub url:   String,
    #[serde(default)]
    pub label: serde_json::Value,
}

/// SQuAD `answers` field: parallel lists, only the first entry is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answers {
    pub answer_start: Vec<usize>,
    pub text:         Vec<String>,
}

/// A character-offset answer span.
///
/// `char_start = 0, text = ""` is the unanswerable sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSpan {
    pub char_start: usize,
    pub text:       String,
}

impl AnswerSpan {
    pub fn new(char_start: usize, text: impl Into<String>) -> Self {
        Self { char_start, text: text.into() }
    }

    pub fn unanswerable() -> Self {
        Self::default()
    }

    pub fn is_unanswerable(&self) -> bool {
        self.text.is_empty()
    }

    /// Exclusive end offset in characters
    pub fn char_end(&self) -> usize {
        self.char_start + self.text.chars().count()
    }

    /// True when `text` really sits at `char_start` inside `context`.
    /// The unanswerable sentinel is always consistent.
    pub fn is_consistent_with(&self, context: &str) -> bool {
        if self.is_unanswerable() {
            return self.char_start == 0;
        }
        let found: String = context
            .chars()
            .skip(self.char_start)
            .take(self.text.chars().count())
            .collect();
        found == self.text
    }
}

/// An extractive QA sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id:       String,
    pub context:  String,
    pub question: String,
    pub answers:  Answers,
    /// Ground-truth canonical brand
    pub title:    String,
}

impl Sample {
    /// Build a sample with a fresh UUID v4 id.
    pub fn new(
        context:  impl Into<String>,
        question: impl Into<String>,
        span:     AnswerSpan,
        title:    impl Into<String>,
    ) -> Self {
        Self {
            id:       uuid::Uuid::new_v4().to_string(),
            context:  context.into(),
            question: question.into(),
            answers:  Answers {
                answer_start: vec![span.char_start],
                text:         vec![span.text],
            },
            title:    title.into(),
        }
    }

    /// First annotated answer, or the unanswerable sentinel when the
    /// answer lists are empty.
    pub fn answer_span(&self) -> AnswerSpan {
        match (self.answers.answer_start.first(), self.answers.text.first()) {
            (Some(&start), Some(text)) => AnswerSpan::new(start, text.clone()),
            _ => AnswerSpan::unanswerable(),
        }
    }
}

/// Find `needle` in `haystack` and return its character offset.
pub fn char_find(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_idx| haystack[..byte_idx].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_end_counts_chars_not_bytes() {
        let span = AnswerSpan::new(2, "Crédit");
        assert_eq!(span.char_end(), 8);
    }

    #[test]
    fn test_span_consistency() {
        let ctx = "<title>Crédit Agricole</title>";
        assert!(AnswerSpan::new(7, "Crédit").is_consistent_with(ctx));
        assert!(!AnswerSpan::new(6, "Crédit").is_consistent_with(ctx));
        assert!(AnswerSpan::unanswerable().is_consistent_with(ctx));
    }

    #[test]
    fn test_sample_answer_span_falls_back_to_sentinel() {
        let mut s = Sample::new("ctx", "q", AnswerSpan::new(0, "ctx"), "Brand");
        assert_eq!(s.answer_span(), AnswerSpan::new(0, "ctx"));

        s.answers = Answers::default();
        assert!(s.answer_span().is_unanswerable());
    }

    #[test]
    fn test_sample_ids_are_unique() {
        let a = Sample::new("c", "q", AnswerSpan::unanswerable(), "B");
        let b = Sample::new("c", "q", AnswerSpan::unanswerable(), "B");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_char_find() {
        assert_eq!(char_find("née PayPal", "PayPal"), Some(4));
        assert_eq!(char_find("abc", "zz"), None);
    }

    #[test]
    fn test_phish_record_optional_fields() {
        let r: PhishRecord =
            serde_json::from_str(r#"{"html":"<p>x</p>","brand":"PayPal"}"#).unwrap();
        assert_eq!(r.brand, "PayPal");
        assert!(r.host.is_empty());
        assert!(r.label.is_null());
    }
}
