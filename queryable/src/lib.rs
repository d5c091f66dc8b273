//! Main queryable crate providing a single entry point to the document store.
//!
//! This crate re-exports the record and query model from `queryable-core`, the
//! collection and query engine from `queryable-memory`, and, with the default `json`
//! feature, the JSON file backend from `queryable-json`.
//!
//! # Features
//!
//! - **Schemaless records** - Records are ordered BSON documents with JSON text in and out
//! - **Mongo-like queries** - Literals, anchored patterns, comparison operators and `$or`
//! - **Stable identifiers** - A monotonically increasing `_id` that is never reused
//! - **Chainable results** - Sort, skip and limit on copies of the matched records
//! - **File persistence** - Load and save a whole collection as one JSON array
//!
//! # Quick Start
//!
//! ```ignore
//! use queryable::prelude::*;
//! use queryable::bson::doc;
//!
//! let mut people = Collection::new();
//! people.insert(vec![
//!     doc! { "name": "Ada", "age": 36, "joined": "now()" },
//!     doc! { "name": "Alan", "age": 41 },
//!     doc! { "name": "Bob", "age": 19 },
//! ])?;
//!
//! let query = Query::parse(doc! {
//!     "name": { "$regex": "A" },
//!     "age": { "$gte": 21 },
//! })?;
//!
//! let oldest = people.find(&query).sort("age", -1).limit(1);
//! println!("{oldest}");
//!
//! people.update(
//!     &Query::parse(doc! { "name": "Bob" })?,
//!     doc! { "$set": { "age": 20 } },
//!     UpdateOptions::default(),
//! )?;
//! ```
//!
//! # Persistence
//!
//! ```ignore
//! use queryable::{prelude::*, json::JsonFileStore};
//!
//! let store = JsonFileStore::builder("people.json").build()?;
//!
//! let mut people = Collection::builder().format(JsonFormat::Pretty).build();
//! people.load_from(&store)?;
//! people.insert(doc! { "name": "Grace" })?;
//! people.save_to(&store)?;
//! ```
//!
//! # Sharing
//!
//! [`memory::SharedCollection`] wraps a collection in an async read-write lock so that
//! lookups run concurrently and mutations run one at a time.

pub mod prelude;

pub use queryable_core::{backend, codec, error, query, record};

// Re-export BSON types for convenience
pub use bson;

/// The in-memory collection, query evaluation and results.
pub mod memory {
    pub use queryable_memory::{
        BulkData, Collection, CollectionBuilder, CollectionOptions, QueryEvaluator, ResultSet,
        SharedCollection, UpdateOptions, UpdateResult,
    };
    pub use queryable_memory::evaluator;
}

/// JSON file persistence.
///
/// This module is only available when the `json` feature is enabled.
#[cfg(feature = "json")]
pub mod json {
    pub use queryable_json::{JsonFileStore, JsonFileStoreBuilder};
}

pub use memory::{Collection, ResultSet, SharedCollection};
