//! JSON file persistence for queryable.
//!
//! This crate provides a file-based implementation of the `StoreBackend` trait. A
//! collection is stored as a single JSON array, rewritten in full on every save.
//!
//! To use this backend through the facade crate, keep the default `json` feature:
//!
//! ```toml
//! [dependencies]
//! queryable = { version = "x.y.z", features = ["json"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use queryable::{backend::StoreBackendBuilder, json::JsonFileStore, Collection};
//!
//! let store = JsonFileStore::builder("data/users.json").build()?;
//!
//! let mut users = Collection::new();
//! users.load_from(&store)?;
//! users.insert(doc! { "name": "Ada" })?;
//! users.save_to(&store)?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as queryable_json;

pub mod store;

pub use store::{JsonFileStore, JsonFileStoreBuilder};
