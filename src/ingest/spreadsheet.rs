use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde_json::{Number, Value};

use super::unique_headers;
use crate::models::Record;
use crate::types::{AppError, AppResult};

/// Largest integer an f64 holds exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Load an `.xlsx`/`.xls` workbook and convert its first sheet.
pub fn parse_workbook(content: &[u8]) -> AppResult<Vec<Record>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))
        .map_err(|e| AppError::Schema(format!("unreadable spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Schema("spreadsheet has no worksheets".to_string()))?
        .map_err(|e| AppError::Schema(format!("unreadable first worksheet: {e}")))?;

    Ok(range_to_records(&range))
}

/// First row supplies the headers; empty cells are left out of the record
/// and rows with no values at all are skipped.
pub fn range_to_records(range: &Range<Data>) -> Vec<Record> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = unique_headers(header_row.iter().map(header_text));

    rows.filter_map(|row| {
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .filter_map(|(name, cell)| cell_value(cell).map(|value| (name.clone(), value)))
            .collect();
        (!record.is_empty()).then_some(record)
    })
    .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => cell_value(other).map(|v| v.to_string()).unwrap_or_default(),
    }
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => number(*f),
        Data::Bool(b) => Some(Value::Bool(*b)),
        // Serial date numbers, as spreadsheet tools export them without date parsing
        Data::DateTime(dt) => number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
    }
}

fn number(f: f64) -> Option<Value> {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}
