//! Tabular Ingestion
//!
//! Converts one uploaded file into a [`Dataset`] of flat records. The format is
//! chosen purely from the file extension:
//!
//! - `.csv` - header row gives the field names, empty lines are skipped
//! - `.xlsx` / `.xls` - first worksheet, first row as headers
//! - `.json` - an array of objects, or a single object wrapped into one record
//!
//! The whole file is buffered and converted before anything downstream sees it,
//! so a failed ingestion never yields a partial dataset.

pub mod delimited;
pub mod demo;
pub mod json;
pub mod spreadsheet;

pub use demo::{demo_dataset, DEMO_SOURCE_NAME};

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::models::Dataset;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
    Json,
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> AppResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Spreadsheet),
            "json" => Ok(FileFormat::Json),
            _ => Err(AppError::Schema(format!(
                "unsupported file type for {file_name:?}; expected .csv, .xlsx, .xls or .json"
            ))),
        }
    }
}

/// Normalize the full contents of an uploaded file into a dataset.
pub fn normalize(file_name: &str, content: &[u8]) -> AppResult<Dataset> {
    let format = FileFormat::from_file_name(file_name)?;

    let result = match format {
        FileFormat::Csv => delimited::parse_csv(content),
        FileFormat::Spreadsheet => spreadsheet::parse_workbook(content),
        FileFormat::Json => json::parse_json(content),
    };

    match &result {
        Ok(dataset) => info!(
            file = %file_name,
            format = ?format,
            records = dataset.len(),
            "Ingested dataset"
        ),
        Err(e) => warn!(file = %file_name, format = ?format, error = %e, "Ingestion failed"),
    }

    result.map(Dataset::new)
}

/// Make header names usable as record keys: blank cells become `__EMPTY`,
/// `__EMPTY_1`, ... and repeated names get `_1`, `_2` suffixes.
pub(crate) fn unique_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();

    for name in raw {
        let trimmed = name.as_ref().trim();
        let base = if trimmed.is_empty() { "__EMPTY" } else { trimmed };

        let mut candidate = base.to_string();
        while let Some(count) = seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}_{}", *count);
        }
        seen.insert(candidate.clone(), 0);
        headers.push(candidate);
    }

    headers
}

/// Read a file from disk and normalize it.
pub async fn normalize_path(path: &Path) -> AppResult<Dataset> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Schema(format!("cannot read {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    normalize(file_name, &content)
}
