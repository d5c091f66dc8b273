//! Core types for record representation and conversion.
//!
//! A record is an ordered mapping from field name to value, represented as a
//! [`bson::Document`]. This module provides the conversion trait used wherever the
//! API accepts "a record or a sequence of records", the identifier helpers, and the
//! `"now()"` timestamp sentinel.

use bson::{Bson, Document};
use chrono::Local;
use serde_json::Value;

use crate::{
    codec::json_to_bson,
    error::{StoreError, StoreResult},
};

/// A single structured entry in a collection.
pub type Record = Document;

/// Default name of the reserved identifier field.
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Field value that is replaced with the current timestamp when it is written by an
/// insert or an update.
///
/// Only exact top-level string values are recognized; `"now() "` or a nested
/// `"now()"` are stored verbatim.
pub const NOW_SENTINEL: &str = "now()";

/// Returns `true` if the value is the [`NOW_SENTINEL`] string.
pub fn is_now_sentinel(value: &Bson) -> bool {
    matches!(value, Bson::String(s) if s == NOW_SENTINEL)
}

/// Renders the current local time as an ISO-8601 string with microseconds and offset.
pub fn current_timestamp() -> String {
    Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f%z")
        .to_string()
}

/// Reads an integer identifier out of a record, accepting either integer width.
pub fn record_id(record: &Record, id_field: &str) -> Option<i64> {
    match record.get(id_field) {
        Some(Bson::Int32(id)) => Some(*id as i64),
        Some(Bson::Int64(id)) => Some(*id),
        _ => None,
    }
}

/// Conversion trait for anything that can be turned into a batch of records.
///
/// Statically typed inputs ([`Record`], `Vec<Record>`) always succeed. Dynamic inputs
/// ([`Bson`], [`serde_json::Value`]) fail with [`StoreError::InvalidRecord`] unless they
/// hold a single document or an array made only of documents.
///
/// # Example
///
/// ```ignore
/// use bson::doc;
/// use queryable_core::record::IntoRecords;
///
/// let one = doc! { "a": 1 }.into_records()?;
/// let many = vec![doc! { "a": 1 }, doc! { "b": 2 }].into_records()?;
/// assert_eq!(one.len() + many.len(), 3);
/// ```
pub trait IntoRecords {
    /// Converts this value into a vector of records.
    fn into_records(self) -> StoreResult<Vec<Record>>;
}

impl IntoRecords for Record {
    fn into_records(self) -> StoreResult<Vec<Record>> {
        Ok(vec![self])
    }
}

impl IntoRecords for Vec<Record> {
    fn into_records(self) -> StoreResult<Vec<Record>> {
        Ok(self)
    }
}

impl IntoRecords for Bson {
    fn into_records(self) -> StoreResult<Vec<Record>> {
        match self {
            Bson::Document(record) => Ok(vec![record]),
            Bson::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Bson::Document(record) => Ok(record),
                    other => Err(StoreError::InvalidRecord(format!(
                        "expected a record, found {:?}",
                        other.element_type()
                    ))),
                })
                .collect(),
            other => Err(StoreError::InvalidRecord(format!(
                "expected a record or an array of records, found {:?}",
                other.element_type()
            ))),
        }
    }
}

impl IntoRecords for Value {
    fn into_records(self) -> StoreResult<Vec<Record>> {
        json_to_bson(self).into_records()
    }
}
