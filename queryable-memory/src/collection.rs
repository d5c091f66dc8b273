//! The in-memory collection and its mutation operations.
//!
//! A [`Collection`] owns an ordered sequence of records and a monotonically increasing
//! identifier counter. Reads go through the [`QueryEvaluator`] and hand back copies;
//! writes edit the owned records in place.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use queryable_core::query::Query;
//! use queryable_memory::{Collection, UpdateOptions};
//!
//! let mut users = Collection::new();
//! users.insert(vec![doc! { "name": "Ada", "seen": "now()" }, doc! { "name": "Bob" }])?;
//!
//! let query = Query::parse(doc! { "name": "Bob" })?;
//! users.update(&query, doc! { "$set": { "admin": true } }, UpdateOptions::default())?;
//! assert_eq!(users.find(&query).count(), 1);
//! ```

use std::iter::Peekable;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use queryable_core::{
    backend::StoreBackend,
    codec::{JsonFormat, records_from_str, records_to_string},
    error::{StoreError, StoreResult},
    query::Query,
    record::{DEFAULT_ID_FIELD, IntoRecords, Record, current_timestamp, is_now_sentinel, record_id},
};

use crate::{
    evaluator::{QueryEvaluator, distinct_positions, values_equal},
    result::ResultSet,
};

/// Key of the patch document inside an update's modification argument.
pub const SET_KEY: &str = "$set";

/// Construction-time settings for a [`Collection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    /// Reserved identifier field, or `None` to never assign identifiers.
    pub id_field: Option<String>,
    /// Rendering used by [`Collection::save_to`] and [`Collection::to_json_string`].
    pub format: JsonFormat,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            id_field: Some(DEFAULT_ID_FIELD.to_string()),
            format: JsonFormat::Compact,
        }
    }
}

/// Flags controlling [`Collection::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
    /// Keep updating after the first record that actually changes.
    pub multi: bool,
    /// Insert the patch as a new record when nothing matches.
    pub upsert: bool,
}

impl UpdateOptions {
    /// Sets whether every matching record is updated, not just the first that changes.
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    /// Sets whether the patch is inserted when no record matches.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Outcome of an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Records matched by the query.
    pub matched: usize,
    /// Records that had at least one field changed.
    pub modified: usize,
    /// Whether the patch was inserted as a new record.
    pub upserted: bool,
    /// Identifier assigned to the upserted record, if identifiers are enabled.
    pub upserted_id: Option<i64>,
}

/// Records to replace a collection's contents with.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkData {
    /// A serialized JSON array of objects.
    Text(String),
    /// Records that are already decoded.
    Records(Vec<Record>),
}

impl From<&str> for BulkData {
    fn from(text: &str) -> Self {
        BulkData::Text(text.to_string())
    }
}

impl From<String> for BulkData {
    fn from(text: String) -> Self {
        BulkData::Text(text)
    }
}

impl From<Vec<Record>> for BulkData {
    fn from(records: Vec<Record>) -> Self {
        BulkData::Records(records)
    }
}

impl TryFrom<Bson> for BulkData {
    type Error = StoreError;

    fn try_from(value: Bson) -> StoreResult<Self> {
        match value {
            Bson::String(text) => Ok(BulkData::Text(text)),
            array @ Bson::Array(_) => Ok(BulkData::Records(array.into_records()?)),
            other => Err(StoreError::InvalidRecord(format!(
                "bulk data must be serialized text or a sequence of records, found {:?}",
                other.element_type()
            ))),
        }
    }
}

impl BulkData {
    fn into_records(self) -> StoreResult<Vec<Record>> {
        match self {
            BulkData::Text(text) => records_from_str(&text),
            BulkData::Records(records) => Ok(records),
        }
    }
}

/// An ordered, memory-resident set of records plus its identifier counter.
///
/// The counter starts at zero, is incremented before each assignment, and never goes
/// down except through [`Collection::clear`]. It is always at least the largest
/// identifier present, so identifiers are never reused after a removal.
///
/// A collection is not synchronized; wrap it in a
/// [`SharedCollection`](crate::shared::SharedCollection) to share it between tasks.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Vec<Record>,
    last_id: i64,
    options: CollectionOptions,
}

impl Collection {
    /// Creates an empty collection using the `_id` identifier field.
    pub fn new() -> Self {
        Self::with_options(CollectionOptions::default())
    }

    /// Creates an empty collection with the given settings.
    pub fn with_options(options: CollectionOptions) -> Self {
        Self {
            records: Vec::new(),
            last_id: 0,
            options,
        }
    }

    /// Creates a builder for a collection with custom settings.
    pub fn builder() -> CollectionBuilder {
        CollectionBuilder::default()
    }

    /// The settings this collection was built with.
    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// The most recently assigned (or observed) identifier.
    pub fn last_id(&self) -> i64 {
        self.last_id
    }

    /// Read-only view of the stored records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of stored records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts one record or a sequence of records and returns how many were added.
    ///
    /// Records without an identifier get the next one. Every top-level field whose value
    /// is `"now()"` is replaced with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if a dynamic input is not a record or a
    /// sequence of records, or if the identifier counter would pass `i64::MAX`. Nothing
    /// is inserted in either case.
    pub fn insert(&mut self, records: impl IntoRecords) -> StoreResult<usize> {
        let ids = self.append(records.into_records()?)?;

        log::debug!("Inserted {} records, last id is {}", ids.len(), self.last_id);

        Ok(ids.len())
    }

    /// Assigns identifiers and timestamps to every record, then appends them all.
    ///
    /// Returns the identifier of each record. The collection is left untouched on error.
    fn append(&mut self, mut records: Vec<Record>) -> StoreResult<Vec<Option<i64>>> {
        let mut last_id = self.last_id;
        let mut ids = Vec::with_capacity(records.len());

        for record in records.iter_mut() {
            ids.push(self.assign_id(record, &mut last_id)?);
            stamp_now(record);
        }

        self.last_id = last_id;
        self.records.append(&mut records);

        Ok(ids)
    }

    /// Gives the record an identifier if it lacks one and keeps `last_id` ahead of it.
    fn assign_id(&self, record: &mut Record, last_id: &mut i64) -> StoreResult<Option<i64>> {
        let Some(id_field) = self.options.id_field.as_deref() else {
            return Ok(None);
        };

        match record_id(record, id_field) {
            Some(id) => {
                *last_id = (*last_id).max(id);
                Ok(Some(id))
            }
            None if record.contains_key(id_field) => Ok(None),
            None => {
                let id = last_id.checked_add(1).ok_or_else(|| {
                    StoreError::InvalidRecord(format!("identifier space exhausted after {last_id}"))
                })?;
                *last_id = id;
                record.insert(id_field, id);
                Ok(Some(id))
            }
        }
    }

    /// Returns copies of every record matching the query.
    pub fn find(&self, query: &Query) -> ResultSet {
        let found = QueryEvaluator::filter_records(&self.records, query);
        log::debug!("find {query} matched {} records", found.len());

        ResultSet::new(found)
    }

    /// Returns copies of every record.
    pub fn find_all(&self) -> ResultSet {
        ResultSet::new(self.records.clone())
    }

    /// Applies `{"$set": patch}` to matching records.
    ///
    /// Without `multi`, scanning stops after the first record that actually changes; a
    /// matched record whose fields already hold the patch values does not count. A field
    /// changes when it is absent, holds a different value (type-strict), or the patch
    /// value is `"now()"`, which is always rewritten with a fresh timestamp. With `upsert`
    /// and no matches, the patch is inserted as a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUpdate`] if the modification has no `$set` document.
    pub fn update(
        &mut self,
        query: &Query,
        modification: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        let patch = set_document(modification)?;
        let positions = QueryEvaluator::new(&self.records).evaluate(query);

        if positions.is_empty() && options.upsert {
            let upserted_id = self.append(vec![patch])?.pop().flatten();
            log::debug!("update {query} matched nothing, upserted id {upserted_id:?}");

            return Ok(UpdateResult {
                upserted: true,
                upserted_id,
                ..UpdateResult::default()
            });
        }

        let mut result = UpdateResult {
            matched: positions.len(),
            ..UpdateResult::default()
        };

        for position in positions {
            if self.apply_patch(position, &patch) {
                result.modified += 1;
            }

            if !options.multi && result.modified > 0 {
                break;
            }
        }

        log::debug!(
            "update {query} matched {} records, modified {}",
            result.matched,
            result.modified
        );

        Ok(result)
    }

    fn apply_patch(&mut self, position: usize, patch: &Document) -> bool {
        let mut changed = false;

        for (key, value) in patch {
            let record = &mut self.records[position];

            if is_now_sentinel(value) {
                record.insert(key.to_string(), current_timestamp());
            } else if record.get(key).is_some_and(|current| values_equal(current, value)) {
                continue;
            } else {
                record.insert(key.to_string(), value.clone());
            }

            changed = true;
        }

        if let Some(id) = self
            .options
            .id_field
            .as_deref()
            .and_then(|field| record_id(&self.records[position], field))
        {
            self.last_id = self.last_id.max(id);
        }

        changed
    }

    /// Removes every matching record and returns how many were removed.
    ///
    /// Records are removed by position, so a record that merely has the same values as
    /// a matched one is left alone.
    pub fn remove(&mut self, query: &Query) -> usize {
        let positions = QueryEvaluator::new(&self.records).evaluate(query);
        let removed = positions.len();

        let mut doomed = positions.into_iter().peekable();
        let mut position = 0;
        self.records.retain(|_| {
            let keep = !next_is(&mut doomed, position);
            position += 1;
            keep
        });

        log::debug!("remove {query} removed {removed} records");

        removed
    }

    /// Returns copies of the first record for each distinct value of `field`.
    ///
    /// Only records that have the field with a non-null value take part. An optional
    /// query narrows the candidates first. Encounter order is preserved.
    pub fn distinct(&self, field: &str, query: Option<&Query>) -> ResultSet {
        let positions = match query {
            Some(query) => QueryEvaluator::new(&self.records).evaluate(query),
            None => (0..self.records.len()).collect(),
        };

        ResultSet::new(
            distinct_positions(&self.records, positions, field)
                .into_iter()
                .map(|position| self.records[position].clone())
                .collect(),
        )
    }

    /// Discards every record and resets the identifier counter to zero.
    pub fn clear(&mut self) {
        self.records.clear();
        self.last_id = 0;
    }

    /// Replaces the collection's records with bulk data.
    ///
    /// The counter is raised to the largest identifier found, then records without an
    /// identifier receive new ones. Fields are otherwise stored as given.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] or [`StoreError::InvalidRecord`] if text
    /// does not parse to an array of records.
    pub fn set_data(&mut self, data: impl Into<BulkData>) -> StoreResult<()> {
        let records = data.into().into_records()?;
        self.replace_records(records)
    }

    fn replace_records(&mut self, mut records: Vec<Record>) -> StoreResult<()> {
        let mut last_id = self.last_id;

        if let Some(id_field) = self.options.id_field.as_deref() {
            let max_id = records
                .iter()
                .filter_map(|record| record_id(record, id_field))
                .max()
                .unwrap_or(0);
            last_id = last_id.max(max_id);
        }

        for record in records.iter_mut() {
            self.assign_id(record, &mut last_id)?;
        }

        self.last_id = last_id;
        self.records = records;

        Ok(())
    }

    /// Loads the collection from a persistence backend.
    ///
    /// If the backend has no data yet, the current records are written to it instead.
    ///
    /// # Errors
    ///
    /// Backend errors are returned unchanged.
    pub fn load_from<B: StoreBackend + ?Sized>(&mut self, backend: &B) -> StoreResult<()> {
        match backend.read_records()? {
            Some(records) => {
                log::info!("Loaded {} records from {backend:?}", records.len());
                self.replace_records(records)?;
            }
            None => {
                log::info!("No data in {backend:?} yet, initializing it");
                self.save_to(backend)?;
            }
        }

        Ok(())
    }

    /// Saves every record using the configured format.
    pub fn save_to<B: StoreBackend + ?Sized>(&self, backend: &B) -> StoreResult<()> {
        self.save_to_with(backend, self.options.format)
    }

    /// Saves every record using `format` for this save only.
    pub fn save_to_with<B: StoreBackend + ?Sized>(&self, backend: &B, format: JsonFormat) -> StoreResult<()> {
        backend.write_records(&self.records, format)?;
        log::info!("Saved {} records to {backend:?}", self.records.len());

        Ok(())
    }

    /// Serializes every record as a JSON array.
    pub fn to_json_string(&self, format: JsonFormat) -> StoreResult<String> {
        records_to_string(&self.records, format)
    }
}

/// Replaces every top-level `"now()"` value with the current timestamp.
fn stamp_now(record: &mut Record) {
    let stamped = record
        .iter()
        .filter(|(_, value)| is_now_sentinel(value))
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>();

    for key in stamped {
        record.insert(key, current_timestamp());
    }
}

fn next_is(positions: &mut Peekable<impl Iterator<Item = usize>>, position: usize) -> bool {
    positions.next_if_eq(&position).is_some()
}

fn set_document(mut modification: Document) -> StoreResult<Document> {
    let patch = match modification.remove(SET_KEY) {
        Some(Bson::Document(patch)) => patch,
        Some(other) => {
            return Err(StoreError::InvalidUpdate(format!(
                "{SET_KEY} must be a document, found {:?}",
                other.element_type()
            )));
        }
        None => {
            return Err(StoreError::InvalidUpdate(format!(
                "modification is missing the {SET_KEY} key"
            )));
        }
    };

    for key in modification.keys() {
        log::warn!("Ignoring unsupported update key {key}");
    }

    Ok(patch)
}

/// Builder for constructing [`Collection`] instances.
///
/// # Example
///
/// ```ignore
/// let collection = Collection::builder()
///     .id_field("key")
///     .format(JsonFormat::Pretty)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct CollectionBuilder {
    options: CollectionOptions,
}

impl CollectionBuilder {
    /// Uses `field` as the identifier field.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.options.id_field = Some(field.into());
        self
    }

    /// Disables identifier assignment.
    pub fn without_id_field(mut self) -> Self {
        self.options.id_field = None;
        self
    }

    /// Sets the default save format.
    pub fn format(mut self, format: JsonFormat) -> Self {
        self.options.format = format;
        self
    }

    /// Builds an empty collection with the configured settings.
    pub fn build(self) -> Collection {
        Collection::with_options(self.options)
    }
}
