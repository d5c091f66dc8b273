//! A minimal JSON document store core: records, the query language and persistence traits.
//!
//! This crate is the core of the queryable project and provides:
//!
//! - **Records** ([`record`]) - The record type and the conversion trait for record batches
//! - **Query model** ([`query`]) - Clause classification, clause variants, and query construction
//! - **JSON codec** ([`codec`]) - Compact and pretty JSON rendering of record arrays
//! - **Persistence abstraction** ([`backend`]) - Traits for load/save collaborators
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! Query evaluation and the collection itself live in `queryable-memory`.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use queryable_core::query::{ClauseKind, Query};
//!
//! let query = Query::parse(doc! { "age": { "$gte": 21 }, "name": "Bob" })?;
//! assert_eq!(query.terms()[0].kind(), ClauseKind::Conditional);
//! ```

#[allow(unused_extern_crates)]
extern crate self as queryable_core;

pub mod backend;
pub mod codec;
pub mod error;
pub mod query;
pub mod record;
