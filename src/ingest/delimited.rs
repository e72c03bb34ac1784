use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

use super::unique_headers;
use crate::models::Record;
use crate::types::{AppError, AppResult};

/// Parse delimited text with a header row. Values stay text. Truly empty
/// lines are skipped by the reader; a row of bare delimiters is kept as a
/// record of empty strings.
pub fn parse_csv(content: &[u8]) -> AppResult<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content);

    let headers = unique_headers(
        rdr.headers()
            .map_err(|e| AppError::Schema(format!("unreadable CSV header: {e}")))?
            .iter(),
    );

    let mut records = Vec::new();
    for (line, row) in rdr.records().enumerate() {
        let row = row.map_err(|e| AppError::Schema(format!("unreadable CSV row {}: {e}", line + 1)))?;

        if row.len() > headers.len() {
            debug!(row = line + 1, extra = row.len() - headers.len(), "Dropping fields beyond header");
        }

        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, field)| (name.clone(), Value::String(field.to_string())))
            .collect();
        records.push(record);
    }

    Ok(records)
}
