//! In-memory collection and query engine for queryable.
//!
//! This crate holds the records and does all the work:
//!
//! - **Collection** ([`collection`]) - Insert, find, update, remove, distinct, bulk load and persistence
//! - **Evaluation** ([`evaluator`]) - Staged filtering of records against a parsed query
//! - **Results** ([`result`]) - Sorting, pagination and serialization of query output
//! - **Sharing** ([`shared`]) - An async-aware locked handle for use across tasks
//!
//! # Quick Start
//!
//! ```ignore
//! use bson::doc;
//! use queryable_core::query::{Query, SortDirection};
//! use queryable_memory::Collection;
//!
//! let mut people = Collection::new();
//! people.insert(vec![
//!     doc! { "name": "Ada", "age": 36 },
//!     doc! { "name": "Bob", "age": 19 },
//! ])?;
//!
//! let adults = people
//!     .find(&Query::parse(doc! { "age": { "$gte": 21 } })?)
//!     .sort("name", SortDirection::Asc);
//! assert_eq!(adults.count(), 1);
//! ```

#[allow(unused_extern_crates)]
extern crate self as queryable_memory;

pub mod collection;
pub mod evaluator;
pub mod result;
pub mod shared;

pub use collection::{BulkData, Collection, CollectionBuilder, CollectionOptions, UpdateOptions, UpdateResult};
pub use evaluator::QueryEvaluator;
pub use result::ResultSet;
pub use shared::SharedCollection;
