//! Ordered, paginable query output.
//!
//! A [`ResultSet`] owns copies of the records it holds. Nothing done to it, or to the
//! records taken out of it, reaches back into the collection that produced it.

use std::fmt::{self, Display};

use queryable_core::{
    codec::{JsonFormat, records_to_string},
    error::StoreResult,
    query::{Sort, SortDirection},
    record::{IntoRecords, Record},
};

use crate::evaluator::sort_order;

/// Chainable wrapper around a sequence of matched records.
///
/// # Example
///
/// ```ignore
/// let names = collection
///     .find(&query)
///     .sort("age", SortDirection::Desc)
///     .skip(10)
///     .limit(5)
///     .to_json_string(JsonFormat::Pretty)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    /// Wraps already-copied records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Stable sort by one field.
    ///
    /// Records missing the field come first in ascending order and last in descending
    /// order. Values of different types are ordered by type (null, booleans, numbers,
    /// strings, date-times, sequences, mappings); equal or unorderable values keep their
    /// relative order.
    pub fn sort(mut self, field: &str, direction: impl Into<SortDirection>) -> Self {
        let direction = direction.into();

        self.records.sort_by(|a, b| {
            let ordering = sort_order(a.get(field), b.get(field));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        self
    }

    /// Applies a [`Sort`] specification.
    pub fn sort_by(self, sort: &Sort) -> Self {
        self.sort(&sort.field, sort.direction)
    }

    /// Keeps only the first `n` records.
    pub fn limit(mut self, n: usize) -> Self {
        self.records.truncate(n);
        self
    }

    /// Drops the first `n` records.
    pub fn skip(mut self, n: usize) -> Self {
        self.records.drain(..n.min(self.records.len()));
        self
    }

    /// Number of records held.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends one record or a sequence of records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`](queryable_core::error::StoreError::InvalidRecord)
    /// if a dynamic input is not a record or a sequence of records.
    pub fn append(mut self, records: impl IntoRecords) -> StoreResult<Self> {
        self.records.extend(records.into_records()?);
        Ok(self)
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Serializes the records as a JSON array.
    pub fn to_json_string(&self, format: JsonFormat) -> StoreResult<String> {
        records_to_string(&self.records, format)
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        ResultSet::new(records)
    }
}

impl IntoIterator for ResultSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Display for ResultSet {
    /// Pretty JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_json_string(JsonFormat::Pretty).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};

    fn numbers() -> ResultSet {
        ResultSet::new(vec![doc! { "n": 3 }, doc! { "n": 1 }, doc! { "n": 2 }])
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        assert_eq!(
            numbers().sort("n", 1).into_records(),
            vec![doc! { "n": 1 }, doc! { "n": 2 }, doc! { "n": 3 }]
        );
        assert_eq!(
            numbers().sort("n", -1).into_records(),
            vec![doc! { "n": 3 }, doc! { "n": 2 }, doc! { "n": 1 }]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let set = ResultSet::new(vec![
            doc! { "k": 1, "tag": "a" },
            doc! { "k": 0, "tag": "b" },
            doc! { "k": 1, "tag": "c" },
        ]);
        let tags = set
            .sort("k", SortDirection::Asc)
            .iter()
            .map(|r| r.get_str("tag").unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(tags, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sort_mixed_and_missing_fields() {
        let set = ResultSet::new(vec![
            doc! { "v": "text" },
            doc! { "other": 1 },
            doc! { "v": 2.5 },
            doc! { "v": Bson::Null },
            doc! { "v": 1 },
        ]);
        assert_eq!(
            set.clone().sort("v", SortDirection::Asc).into_records(),
            vec![
                doc! { "other": 1 },
                doc! { "v": Bson::Null },
                doc! { "v": 1 },
                doc! { "v": 2.5 },
                doc! { "v": "text" },
            ]
        );
        assert_eq!(
            set.sort("v", SortDirection::Desc).first(),
            Some(&doc! { "v": "text" })
        );
    }

    #[test]
    fn test_sort_with_nan_values_is_total() {
        let records = (0..200)
            .map(|i| {
                if i % 7 == 0 {
                    doc! { "v": f64::NAN, "i": i }
                } else {
                    doc! { "v": ((i * 37 % 101) as f64), "i": i }
                }
            })
            .collect::<Vec<_>>();
        let nan_count = records.iter().filter(|r| r.get_f64("v").unwrap().is_nan()).count();

        let sorted = ResultSet::new(records.clone())
            .sort("v", SortDirection::Asc)
            .into_records()
            .into_iter()
            .map(|r| r.get_f64("v").unwrap())
            .collect::<Vec<_>>();
        let (numbers, nans) = sorted.split_at(sorted.len() - nan_count);
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        assert!(nans.iter().all(|v| v.is_nan()));

        let descending = ResultSet::new(records).sort("v", SortDirection::Desc);
        assert!(descending.first().unwrap().get_f64("v").unwrap().is_nan());
    }

    #[test]
    fn test_sort_mixes_integers_and_floats() {
        let set = ResultSet::new(vec![doc! { "v": 2.5 }, doc! { "v": 3 }, doc! { "v": 1_i64 }, doc! { "v": 2.0 }]);
        assert_eq!(
            set.sort("v", SortDirection::Asc).into_records(),
            vec![doc! { "v": 1_i64 }, doc! { "v": 2.0 }, doc! { "v": 2.5 }, doc! { "v": 3 }]
        );
    }

    #[test]
    fn test_limit_and_skip() {
        assert_eq!(numbers().skip(1).limit(1).into_records(), vec![doc! { "n": 1 }]);
        assert_eq!(numbers().skip(10).count(), 0);
        assert_eq!(numbers().limit(10).count(), 3);
    }

    #[test]
    fn test_append_one_or_many() {
        let set = ResultSet::default()
            .append(doc! { "a": 1 })
            .unwrap()
            .append(vec![doc! { "a": 2 }, doc! { "a": 3 }])
            .unwrap();
        assert_eq!(set.count(), 3);
        assert!(ResultSet::default().append(Bson::Int32(4)).is_err());
    }

    #[test]
    fn test_serialization_forms() {
        let set = ResultSet::new(vec![doc! { "a": 1 }]);
        assert_eq!(set.to_json_string(JsonFormat::Compact).unwrap(), r#"[{"a":1}]"#);
        assert_eq!(set.to_string(), "[\n  {\n    \"a\": 1\n  }\n]");
    }
}
