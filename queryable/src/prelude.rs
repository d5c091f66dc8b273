//! Convenient re-exports of commonly used types from queryable.
//!
//! ```ignore
//! use queryable::prelude::*;
//! ```
//!
//! This provides access to:
//! - The collection, its options and update types
//! - Query construction and filtering
//! - Result sets and sort directions
//! - Persistence traits, formats and error types

pub use queryable_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    codec::JsonFormat,
    error::{StoreError, StoreResult},
    query::{Clause, ClauseKind, ClauseVisitor, Filter, Operator, Pattern, Query, QueryBuilder, Sort, SortDirection, Term},
    record::{IntoRecords, Record},
};
pub use queryable_memory::{
    BulkData, Collection, CollectionBuilder, CollectionOptions, ResultSet, SharedCollection, UpdateOptions,
    UpdateResult,
};
