use serde_json::Value;

use crate::models::Record;
use crate::types::{AppError, AppResult};

/// Parse a JSON array of objects, or a single object treated as one record.
pub fn parse_json(content: &[u8]) -> AppResult<Vec<Record>> {
    let parsed: Value = serde_json::from_slice(content)
        .map_err(|e| AppError::Schema(format!("JSON parsing failure: {e}")))?;

    match parsed {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(AppError::Schema(format!(
                    "entry {idx} is {} rather than an object",
                    kind(&other)
                ))),
            })
            .collect(),
        Value::Object(record) => Ok(vec![record]),
        other => Err(AppError::Schema(format!(
            "expected an object or an array of objects, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
