//! Statbank response to Polars DataFrame conversion
//!
//! Two inputs are supported:
//! - a flat JSON list of uniform records (`[{"Tid": "2023", "INDHOLD": 100}, ...]`)
//! - delimited text as returned by the `CSV` format
//!
//! Anything else is rejected with [`StatbankError::Reshape`] instead of being
//! squeezed into a frame of unclear meaning.

use super::error::{Result, StatbankError};
use polars::prelude::*;
use serde_json::Value as JsonValue;

/// Column type inferred from the JSON values of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Str,
    /// Mixed scalar types, rendered as strings
    Mixed,
}

impl ColumnKind {
    fn of(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(_) => Some(ColumnKind::Bool),
            JsonValue::Number(n) if n.is_i64() => Some(ColumnKind::Int),
            JsonValue::Number(_) => Some(ColumnKind::Float),
            JsonValue::String(_) => Some(ColumnKind::Str),
            // Nested values are rejected before inference
            JsonValue::Array(_) | JsonValue::Object(_) => Some(ColumnKind::Mixed),
        }
    }

    fn merge(self, other: Self) -> Self {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Mixed,
        }
    }
}

/// Convert a flat list of uniform JSON records to a DataFrame
///
/// Columns follow the field order of the first record; rows keep input order.
/// `null` becomes a missing value.
pub fn records_to_frame(json: &JsonValue) -> Result<DataFrame> {
    let records = json.as_array().ok_or_else(|| {
        StatbankError::Reshape(format!(
            "expected a list of records, got {}",
            json_kind(json)
        ))
    })?;

    let Some(first) = records.first() else {
        return Ok(DataFrame::empty());
    };

    let first = first.as_object().ok_or_else(|| {
        StatbankError::Reshape(format!(
            "record 0 is {}, expected an object",
            json_kind(&records[0])
        ))
    })?;
    let names: Vec<&String> = first.keys().collect();
    if names.is_empty() {
        return Err(StatbankError::Reshape(format!(
            "{} records without fields",
            records.len()
        )));
    }

    for (idx, record) in records.iter().enumerate() {
        let fields = record.as_object().ok_or_else(|| {
            StatbankError::Reshape(format!(
                "record {} is {}, expected an object",
                idx,
                json_kind(record)
            ))
        })?;

        if fields.len() != names.len() || !names.iter().all(|n| fields.contains_key(n.as_str())) {
            let got: Vec<&String> = fields.keys().collect();
            return Err(StatbankError::Reshape(format!(
                "record {} has fields {:?}, expected {:?}",
                idx, got, names
            )));
        }

        if let Some((name, value)) = fields
            .iter()
            .find(|(_, v)| matches!(v, JsonValue::Array(_) | JsonValue::Object(_)))
        {
            return Err(StatbankError::Reshape(format!(
                "record {} field '{}' holds nested {}",
                idx,
                name,
                json_kind(value)
            )));
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        let values: Vec<&JsonValue> = records
            .iter()
            .map(|r| r.get(name.as_str()).unwrap_or(&JsonValue::Null))
            .collect();
        columns.push(json_column_to_series(name, &values).into_column());
    }

    tracing::debug!(
        columns = columns.len(),
        rows = records.len(),
        "Reshaped JSON records into frame"
    );

    DataFrame::new(columns).map_err(StatbankError::from)
}

/// Build one typed Series from the values of a field
fn json_column_to_series(name: &str, values: &[&JsonValue]) -> Series {
    let kind = values
        .iter()
        .filter_map(|v| ColumnKind::of(v))
        .reduce(ColumnKind::merge)
        .unwrap_or(ColumnKind::Str);

    match kind {
        ColumnKind::Int => {
            let data: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Float => {
            let data: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Bool => {
            let data: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Str => {
            let data: Vec<Option<String>> = values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Mixed => {
            let data: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    JsonValue::Null => None,
                    JsonValue::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name.into(), data)
        }
    }
}

/// Convert a CSV body to a DataFrame of string columns
///
/// The delimiter is taken from the header line (`;` when present, else `,`).
pub fn csv_to_frame(text: &str) -> Result<DataFrame> {
    let text = text.trim_start_matches('\u{feff}');
    let Some(header_line) = text.lines().next().filter(|l| !l.trim().is_empty()) else {
        return Ok(DataFrame::empty());
    };
    let delimiter = if header_line.contains(';') { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let names: Vec<String> = reader
        .headers()
        .map_err(|e| StatbankError::Reshape(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (idx, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| StatbankError::Reshape(format!("Failed to parse CSV row {}: {}", idx, e)))?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(Some(cell.to_string()));
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells)
        .map(|(name, data)| Series::new(name.as_str().into(), data).into_column())
        .collect();

    DataFrame::new(columns).map_err(StatbankError::from)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
