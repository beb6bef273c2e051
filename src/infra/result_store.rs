// ============================================================
// Layer 6 — Result Store
// ============================================================
// Persists a ResultTable so it can be re-analysed without
// rerunning inference. The format follows the file extension:
//
//   .csv    header: inference,identified,similarity,answer,correct,html
//   .jsonl  one InferenceRecord object per line
//
// HTML contexts contain commas, quotes and newlines, so CSV rows
// are written with full RFC 4180 quoting by the csv crate.

use anyhow::{bail, Context, Result};
use std::{fs, path::Path};

use crate::data::loader::{read_jsonl, write_jsonl};
use crate::domain::record::{InferenceRecord, ResultTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Jsonl,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "csv" => Ok(Self::Csv),
            Some(ext) if ext == "jsonl" => Ok(Self::Jsonl),
            _ => bail!(
                "Unsupported result file '{}': expected a .csv or .jsonl extension",
                path.display()
            ),
        }
    }
}

pub fn save_results(path: &Path, table: &ResultTable) -> Result<()> {
    let format = TableFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    match format {
        TableFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("Cannot create '{}'", path.display()))?;
            for record in table.records() {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        TableFormat::Jsonl => {
            write_jsonl(path, table.records(), None)?;
        }
    }

    tracing::info!("Saved {} results to '{}'", table.len(), path.display());
    Ok(())
}

pub fn load_results(path: &Path) -> Result<ResultTable> {
    let records: Vec<InferenceRecord> = match TableFormat::from_path(path)? {
        TableFormat::Csv => {
            let mut reader = csv::Reader::from_path(path)
                .with_context(|| format!("Cannot open '{}'", path.display()))?;
            reader
                .deserialize()
                .enumerate()
                .map(|(i, row)| {
                    row.with_context(|| format!("Malformed row {} in '{}'", i + 1, path.display()))
                })
                .collect::<Result<_>>()?
        }
        TableFormat::Jsonl => read_jsonl(path)?,
    };

    tracing::info!("Loaded {} results from '{}'", records.len(), path.display());
    Ok(ResultTable::new(records))
}
