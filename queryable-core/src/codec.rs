//! JSON text encoding for record sequences.
//!
//! The persisted form of a collection is a JSON array of objects. Records live in
//! memory as BSON documents; this module converts between the two, keeping field
//! order intact, and renders either a compact or an indented form.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::{
    error::{StoreError, StoreResult},
    record::{IntoRecords, Record},
};

/// Text rendering used when serializing records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonFormat {
    /// No whitespace between tokens.
    #[default]
    Compact,
    /// Two-space indentation, one field per line.
    Pretty,
}

/// Converts a BSON value into its JSON counterpart.
///
/// Integers of both widths become JSON integers and doubles stay floating-point, so a
/// round trip preserves the integer/float distinction. Non-finite doubles become `null`.
/// Date-times are rendered as RFC 3339 strings; other BSON-only types use their display form.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(value) => Value::Bool(*value),
        Bson::Int32(value) => Value::Number((*value).into()),
        Bson::Int64(value) => Value::Number((*value).into()),
        Bson::Double(value) => Number::from_f64(*value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(value) => Value::String(value.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::DateTime(value) => Value::String(value.to_chrono().to_rfc3339()),
        other => Value::String(other.to_string()),
    }
}

/// Converts a JSON value into BSON, mapping integers to `Int64` and other numbers to `Double`.
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(value) => Bson::Boolean(value),
        Value::Number(number) => match number.as_i64() {
            Some(value) => Bson::Int64(value),
            None => Bson::Double(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(value) => Bson::String(value),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(k, v)| (k, json_to_bson(v)))
                .collect::<Document>(),
        ),
    }
}

fn document_to_json(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(k, v)| (k.to_string(), bson_to_json(v)))
        .collect()
}

/// Serializes a sequence of records as a JSON array in the requested format.
pub fn records_to_string(records: &[Record], format: JsonFormat) -> StoreResult<String> {
    let array = Value::Array(
        records
            .iter()
            .map(|record| Value::Object(document_to_json(record)))
            .collect(),
    );

    Ok(match format {
        JsonFormat::Compact => serde_json::to_string(&array)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(&array)?,
    })
}

/// Parses a JSON array of objects into records.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the text is not valid JSON and
/// [`StoreError::InvalidRecord`] if it is not an array made only of objects.
pub fn records_from_str(text: &str) -> StoreResult<Vec<Record>> {
    match serde_json::from_str::<Value>(text)? {
        array @ Value::Array(_) => array.into_records(),
        other => Err(StoreError::InvalidRecord(format!(
            "expected a JSON array of records, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
