// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Line-delimited JSON is the on-disk format for every dataset the
// pipeline reads or writes:
//
//   records.jsonl   PhishRecord per line   (input to `prepare`)
//   samples.jsonl   Sample per line        (output of `prepare`)
//   aligned.jsonl   TokenizedSample / line (optional `prepare` output)
//
// Brand lists are either a JSON array or one name per line.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::domain::brand::CanonicalBrandSet;
use crate::domain::sample::{PhishRecord, Sample};

/// Read every non-blank line of a JSONL file.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let mut items = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Cannot read '{}'", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).with_context(|| {
            format!("Malformed JSON on line {} of '{}'", line_no + 1, path.display())
        })?;
        items.push(item);
    }

    tracing::debug!("Read {} rows from '{}'", items.len(), path.display());
    Ok(items)
}

/// Write one JSON object per line, stopping after `cap` rows when given.
/// Returns the number of rows written.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T], cap: Option<usize>) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut out = BufWriter::new(file);

    let limit = cap.unwrap_or(usize::MAX);
    let mut written = 0usize;
    for item in items.iter().take(limit) {
        serde_json::to_writer(&mut out, item)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;

    tracing::debug!("Wrote {} rows to '{}'", written, path.display());
    Ok(written)
}

pub fn load_phish_records(path: &Path) -> Result<Vec<PhishRecord>> {
    read_jsonl(path)
}

/// Load SQuAD-like samples. Samples whose answer text does not sit
/// at its recorded offset are kept but reported.
pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let samples: Vec<Sample> = read_jsonl(path)?;
    let misplaced = samples
        .iter()
        .filter(|s| !s.answer_span().is_consistent_with(&s.context))
        .count();
    if misplaced > 0 {
        tracing::warn!(
            "{} of {} samples in '{}' have an answer that is not at its start offset",
            misplaced,
            samples.len(),
            path.display()
        );
    }
    Ok(samples)
}

/// Load a brand list: a JSON array of names, or one name per line.
pub fn load_brand_list(path: &Path) -> Result<CanonicalBrandSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read brand list '{}'", path.display()))?;

    let names: Vec<String> = if text.trim_start().starts_with('[') {
        serde_json::from_str(&text)
            .with_context(|| format!("Malformed brand list '{}'", path.display()))?
    } else {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    };

    let set = CanonicalBrandSet::new(names)
        .with_context(|| format!("Brand list '{}'", path.display()))?;
    tracing::info!("Loaded {} canonical brands from '{}'", set.len(), path.display());
    Ok(set)
}

/// Canonical brands implied by a dataset: its unique titles, sorted.
pub fn brands_from_samples(samples: &[Sample]) -> Result<CanonicalBrandSet> {
    CanonicalBrandSet::from_unordered(samples.iter().map(|s| s.title.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::AnswerSpan;

    #[test]
    fn test_jsonl_cap_and_reload() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("samples.jsonl");
        let samples: Vec<Sample> = (0..5)
            .map(|i| Sample::new(format!("<p>{i}</p>"), "q", AnswerSpan::unanswerable(), "B"))
            .collect();

        assert_eq!(write_jsonl(&path, &samples, Some(3)).unwrap(), 3);
        let back = load_samples(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[0], samples[0]);
    }

    #[test]
    fn test_blank_lines_are_skipped_and_errors_name_the_line() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        fs::write(&path, "{\"html\":\"a\",\"brand\":\"B\"}\n\n{oops}\n").unwrap();

        let err = load_phish_records(&path).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn test_misplaced_answers_are_still_loaded() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.jsonl");
        let samples = vec![
            Sample::new("<p>PayPal</p>", "q", AnswerSpan::new(3, "PayPal"), "PayPal"),
            Sample::new("<p>DHL</p>", "q", AnswerSpan::new(0, "DHL"), "DHL"),
        ];
        write_jsonl(&path, &samples, None).unwrap();

        let loaded = load_samples(&path).unwrap();
        assert_eq!(loaded, samples);
        assert!(!loaded[1].answer_span().is_consistent_with(&loaded[1].context));
    }

    #[test]
    fn test_brand_list_formats() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("brands.json");
        fs::write(&json, r#"["PayPal", "DHL"]"#).unwrap();
        assert_eq!(load_brand_list(&json).unwrap().len(), 2);

        let lines = dir.path().join("brands.txt");
        fs::write(&lines, "PayPal\n\nDHL\n").unwrap();
        let set = load_brand_list(&lines).unwrap();
        assert_eq!(set.names(), &["PayPal".to_string(), "DHL".to_string()]);

        let repeated = dir.path().join("repeated.txt");
        fs::write(&repeated, "PayPal\nDHL\nPayPal\n").unwrap();
        let err = load_brand_list(&repeated).unwrap_err();
        assert!(format!("{err:#}").contains("Duplicate brand name"));
    }

    #[test]
    fn test_brands_from_samples_are_sorted() {
        let samples: Vec<Sample> = ["Z", "A", "Z"]
            .iter()
            .map(|t| Sample::new("c", "q", AnswerSpan::unanswerable(), *t))
            .collect();
        let set = brands_from_samples(&samples).unwrap();
        assert_eq!(set.names(), &["A".to_string(), "Z".to_string()]);
    }
}
