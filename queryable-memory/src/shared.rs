//! Task-safe handle to a collection.
//!
//! [`SharedCollection`] wraps a [`Collection`] in an async-aware read-write lock so
//! clones of the handle can be used from several tasks. Reads take the read lock,
//! mutations the write lock; each operation holds the lock only for its own duration.

use std::sync::Arc;

use bson::Document;
use mea::rwlock::RwLock;

use queryable_core::{
    backend::StoreBackend,
    codec::JsonFormat,
    error::StoreResult,
    query::Query,
    record::IntoRecords,
};

use crate::{
    collection::{BulkData, Collection, UpdateOptions, UpdateResult},
    result::ResultSet,
};

/// Cloneable, lock-protected [`Collection`].
///
/// Clones share the same records.
///
/// # Example
///
/// ```ignore
/// use queryable_memory::{Collection, SharedCollection};
///
/// let shared = SharedCollection::new(Collection::new());
/// let writer = shared.clone();
/// writer.insert(doc! { "name": "Ada" }).await?;
/// assert_eq!(shared.count().await, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedCollection {
    inner: Arc<RwLock<Collection>>,
}

impl SharedCollection {
    /// Wraps a collection in a new shared handle.
    pub fn new(collection: Collection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Inserts records under the write lock. See [`Collection::insert`].
    pub async fn insert(&self, records: impl IntoRecords) -> StoreResult<usize> {
        self.inner.write().await.insert(records)
    }

    /// Runs a query under the read lock. See [`Collection::find`].
    pub async fn find(&self, query: &Query) -> ResultSet {
        self.inner.read().await.find(query)
    }

    /// Copies every record under the read lock.
    pub async fn find_all(&self) -> ResultSet {
        self.inner.read().await.find_all()
    }

    /// Applies a `$set` update under the write lock. See [`Collection::update`].
    pub async fn update(
        &self,
        query: &Query,
        modification: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        self.inner.write().await.update(query, modification, options)
    }

    /// Removes matching records under the write lock. See [`Collection::remove`].
    pub async fn remove(&self, query: &Query) -> usize {
        self.inner.write().await.remove(query)
    }

    /// Picks one record per distinct value under the read lock. See [`Collection::distinct`].
    pub async fn distinct(&self, field: &str, query: Option<&Query>) -> ResultSet {
        self.inner.read().await.distinct(field, query)
    }

    /// Number of stored records.
    pub async fn count(&self) -> usize {
        self.inner.read().await.count()
    }

    /// The most recently assigned (or observed) identifier.
    pub async fn last_id(&self) -> i64 {
        self.inner.read().await.last_id()
    }

    /// Discards every record and resets the identifier counter.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Replaces the records with bulk data. See [`Collection::set_data`].
    pub async fn set_data(&self, data: impl Into<BulkData>) -> StoreResult<()> {
        self.inner.write().await.set_data(data)
    }

    /// Loads from a backend under the write lock. See [`Collection::load_from`].
    pub async fn load_from<B: StoreBackend + ?Sized>(&self, backend: &B) -> StoreResult<()> {
        self.inner.write().await.load_from(backend)
    }

    /// Saves to a backend under the read lock. See [`Collection::save_to`].
    pub async fn save_to<B: StoreBackend + ?Sized>(&self, backend: &B) -> StoreResult<()> {
        self.inner.read().await.save_to(backend)
    }

    /// Serializes every record as a JSON array.
    pub async fn to_json_string(&self, format: JsonFormat) -> StoreResult<String> {
        self.inner.read().await.to_json_string(format)
    }

    /// Runs `f` with shared access to the collection.
    pub async fn with_read<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        f(&*self.inner.read().await)
    }

    /// Runs `f` with exclusive access to the collection.
    pub async fn with_write<R>(&self, f: impl FnOnce(&mut Collection) -> R) -> R {
        f(&mut *self.inner.write().await)
    }
}

impl From<Collection> for SharedCollection {
    fn from(collection: Collection) -> Self {
        SharedCollection::new(collection)
    }
}
