//! Error types and result types for document store operations.
//!
//! Matching never fails: heterogeneous or incomparable values simply do not match.
//! Errors only come from malformed input (records, bulk data, queries, updates) and
//! from the persistence collaborator. Use [`StoreResult<T>`] as the return type for
//! fallible operations.

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a collection.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Persisted or bulk text could not be parsed or rendered as JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An insert or bulk-data argument is not a record or a sequence of records.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// A query could not be constructed, e.g. because a pattern failed to compile.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// An update's modification argument lacks a `$set` document.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
    /// An error occurred in the persistence backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for collection operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<regex::Error> for StoreError {
    fn from(err: regex::Error) -> Self {
        StoreError::InvalidQuery(err.to_string())
    }
}
