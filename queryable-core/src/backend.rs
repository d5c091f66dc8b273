//! Persistence backend abstraction for collections.
//!
//! A collection lives entirely in memory. Loading and saving go through a
//! [`StoreBackend`], which only has to move a whole record array in and out of some
//! backing medium. The JSON file backend lives in the `queryable-json` crate.
//!
//! # Examples
//!
//! ```ignore
//! use queryable_core::{backend::StoreBackend, codec::JsonFormat};
//!
//! let backend = MyBackendImpl::new();
//! backend.write_records(&records, JsonFormat::Pretty)?;
//! let restored = backend.read_records()?.unwrap_or_default();
//! ```

use std::fmt::Debug;

use crate::{codec::JsonFormat, error::StoreResult, record::Record};

/// Abstract interface for persistence collaborators.
///
/// Implementations read and write the full record array at once; there is no
/// partial or incremental access. Errors are returned to the caller as-is and are
/// never retried.
pub trait StoreBackend: Send + Sync + Debug {
    /// Reads every persisted record.
    ///
    /// Returns `Ok(None)` when the backing medium holds no data yet (for example, the
    /// file has not been created), so the caller can decide to initialize it.
    ///
    /// # Errors
    ///
    /// Returns an error if the data exists but cannot be read or parsed.
    fn read_records(&self) -> StoreResult<Option<Vec<Record>>>;

    /// Replaces the persisted data with the given records, rendered in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be rendered or written.
    fn write_records(&self, records: &[Record], format: JsonFormat) -> StoreResult<()>;
}

impl<B: StoreBackend + ?Sized> StoreBackend for &B {
    fn read_records(&self) -> StoreResult<Option<Vec<Record>>> {
        (**self).read_records()
    }

    fn write_records(&self, records: &[Record], format: JsonFormat) -> StoreResult<()> {
        (**self).write_records(records, format)
    }
}

impl<B: StoreBackend + ?Sized> StoreBackend for Box<B> {
    fn read_records(&self) -> StoreResult<Option<Vec<Record>>> {
        (**self).read_records()
    }

    fn write_records(&self, records: &[Record], format: JsonFormat) -> StoreResult<()> {
        (**self).write_records(records, format)
    }
}

/// Factory trait for constructing backend instances.
pub trait StoreBackendBuilder {
    /// The type of backend this builder produces.
    type Backend: StoreBackend;

    /// Builds and returns a configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    fn build(self) -> StoreResult<Self::Backend>;
}
