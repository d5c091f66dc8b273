//! Query evaluation over in-memory records.
//!
//! Evaluation is a sequential scan. Each query term is one filtering stage over the
//! candidates left by the previous stage, so the result is the intersection of all
//! terms and always keeps the collection's relative order. Matching never fails:
//! values of incompatible types simply do not match.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, DateTime, Document};

use queryable_core::{
    codec::bson_to_json,
    query::{Clause, ClauseKind, ClauseVisitor, Operator, Pattern, Query, Term},
    record::Record,
};

/// Type-erased view of a BSON value used for equality and ordering.
///
/// Both integer widths collapse into `Int`, so `Int32(1)` and `Int64(1)` are the same
/// value, while `Int(1)` and `Float(1.0)` remain distinct types.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(&'a [Bson]),
    Map(&'a Document),
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(*value as i64),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Float(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(items) => Comparable::Array(items),
            Bson::Document(doc) => Comparable::Map(doc),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of this value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 1,
            Comparable::Bool(_) => 2,
            Comparable::Int(_) | Comparable::Float(_) => 3,
            Comparable::String(_) => 4,
            Comparable::DateTime(_) => 5,
            Comparable::Array(_) => 6,
            Comparable::Map(_) => 7,
            Comparable::Other(_) => 8,
        }
    }
}

/// Type-strict equality: same type and same value, recursively for sequences and mappings.
pub fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (Comparable::from(left), Comparable::from(right)) {
        (Comparable::Null, Comparable::Null) => true,
        (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
        (Comparable::Int(a), Comparable::Int(b)) => a == b,
        (Comparable::Float(a), Comparable::Float(b)) => a == b,
        (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
        (Comparable::String(a), Comparable::String(b)) => a == b,
        (Comparable::Array(a), Comparable::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Comparable::Map(a), Comparable::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        (Comparable::Other(a), Comparable::Other(b)) => a == b,
        _ => false,
    }
}

/// Comparability guard for the ordering operators.
///
/// Two values are comparable if they have the same type, or if one is an integer and
/// the other a float. Null and boolean values are never comparable.
pub fn is_comparable(left: &Bson, right: &Bson) -> bool {
    let (left, right) = (Comparable::from(left), Comparable::from(right));

    match (&left, &right) {
        (Comparable::Null | Comparable::Bool(_), _) | (_, Comparable::Null | Comparable::Bool(_)) => false,
        (Comparable::Int(_) | Comparable::Float(_), Comparable::Int(_) | Comparable::Float(_)) => true,
        _ => std::mem::discriminant(&left) == std::mem::discriminant(&right),
    }
}

/// Natural ordering of two values of the same type (integers and floats count as one).
///
/// Sequences compare element by element. Returns `None` when there is no natural order.
pub fn compare_values(left: &Bson, right: &Bson) -> Option<Ordering> {
    match (Comparable::from(left), Comparable::from(right)) {
        (Comparable::Int(a), Comparable::Int(b)) => Some(a.cmp(&b)),
        (Comparable::Int(a), Comparable::Float(b)) => compare_int_float(a, b),
        (Comparable::Float(a), Comparable::Int(b)) => compare_int_float(b, a).map(Ordering::reverse),
        (Comparable::Float(a), Comparable::Float(b)) => a.partial_cmp(&b),
        (Comparable::String(a), Comparable::String(b)) => Some(a.cmp(b)),
        (Comparable::DateTime(a), Comparable::DateTime(b)) => Some(a.cmp(&b)),
        (Comparable::Array(a), Comparable::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    ordering => return Some(ordering),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => None,
    }
}

/// Exact comparison of an integer with a float, without rounding the integer.
///
/// Returns `None` when the float is NaN.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float above every i64
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float < -BOUND {
        return Some(Ordering::Greater);
    }

    let whole = float.trunc();
    Some(int.cmp(&(whole as i64)).then_with(|| {
        if float > whole {
            Ordering::Less
        } else if float < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

/// Numeric equality across integer widths and floats; `1`, `1_i64` and `1.0` are equal.
fn numbers_equal(left: &Bson, right: &Bson) -> bool {
    matches!(
        (Comparable::from(left), Comparable::from(right)),
        (Comparable::Int(_) | Comparable::Float(_), Comparable::Int(_) | Comparable::Float(_))
    ) && compare_values(left, right) == Some(Ordering::Equal)
}

/// Generic truthiness: null, `false`, zero, and empty text, sequences or mappings are falsy.
pub fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Null => false,
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        Bson::String(value) => !value.is_empty(),
        Bson::Array(items) => !items.is_empty(),
        Bson::Document(doc) => !doc.is_empty(),
        _ => true,
    }
}

/// Presence test used by `$exists`: a field counts as present only if it exists and
/// is truthy, so `{"a": 0}` does not have field `a`.
pub fn is_considered_present(value: Option<&Bson>) -> bool {
    value.is_some_and(is_truthy)
}

/// Strict presence test: the field exists, whatever its value.
pub fn is_strictly_present(value: Option<&Bson>) -> bool {
    value.is_some()
}

/// Membership test for `$in`/`$nin`. A non-sequence operand acts as a one-element sequence.
///
/// Integers and floats compare by numeric value, so `2.0` is a member of `[2]`. Every
/// other type must match exactly; `true` is not a member of `[1]`.
fn is_member(value: &Bson, operand: &Bson) -> bool {
    let same = |item: &Bson| numbers_equal(item, value) || values_equal(item, value);

    match operand {
        Bson::Array(items) => items.iter().any(same),
        single => same(single),
    }
}

/// Pure comparison of a field value (left) against an operand (right).
pub type Comparator = fn(&Bson, &Bson) -> bool;

static COMPARATORS: [(Operator, Comparator); 7] = [
    (Operator::Lt, |a, b| is_comparable(a, b) && compare_values(a, b) == Some(Ordering::Less)),
    (Operator::Lte, |a, b| {
        is_comparable(a, b) && matches!(compare_values(a, b), Some(Ordering::Less | Ordering::Equal))
    }),
    (Operator::Gt, |a, b| is_comparable(a, b) && compare_values(a, b) == Some(Ordering::Greater)),
    (Operator::Gte, |a, b| {
        is_comparable(a, b) && matches!(compare_values(a, b), Some(Ordering::Greater | Ordering::Equal))
    }),
    (Operator::Eq, |a, b| {
        is_comparable(a, b) && (compare_values(a, b) == Some(Ordering::Equal) || values_equal(a, b))
    }),
    (Operator::In, |a, b| is_member(a, b)),
    (Operator::Nin, |a, b| !is_member(a, b)),
];

/// Looks up the comparison function for a table-driven operator.
///
/// `$exists` and `$ne` have their own presence rules and are not in the table.
pub fn comparator(op: Operator) -> Option<Comparator> {
    COMPARATORS
        .iter()
        .find(|(candidate, _)| *candidate == op)
        .map(|(_, compare)| *compare)
}

/// Textual form of a value for pattern matching.
///
/// Strings are used as-is. Booleans and null render as `True`, `False` and `None`,
/// so `^T` matches `true`. Numbers, sequences and mappings render as compact JSON (`1`, `2.0`, `[1,"a"]`).
fn textual_form(value: &Bson) -> String {
    match value {
        Bson::String(text) => text.clone(),
        Bson::Boolean(true) => "True".to_string(),
        Bson::Boolean(false) => "False".to_string(),
        Bson::Null => "None".to_string(),
        other => bson_to_json(other).to_string(),
    }
}

/// Deterministic total order used for sorting result sets.
///
/// Missing fields sort first, then values by type: null, booleans, numbers, strings,
/// date-times, sequences, mappings, everything else. Within a type the natural order
/// applies. Integers and floats are compared exactly, and NaN sorts after every other
/// number. Mappings and unrecognized types compare as equal so a stable sort keeps
/// their original order.
pub(crate) fn sort_order(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let (ca, cb) = (Comparable::from(a), Comparable::from(b));
            ca.rank()
                .cmp(&cb.rank())
                .then_with(|| match (ca, cb) {
                    (Comparable::Bool(x), Comparable::Bool(y)) => x.cmp(&y),
                    (Comparable::Float(x), Comparable::Float(y)) => float_sort_order(x, y),
                    (Comparable::Float(x), Comparable::Int(_)) if x.is_nan() => Ordering::Greater,
                    (Comparable::Int(_), Comparable::Float(y)) if y.is_nan() => Ordering::Less,
                    (Comparable::Array(xs), Comparable::Array(ys)) => xs
                        .iter()
                        .zip(ys)
                        .map(|(x, y)| sort_order(Some(x), Some(y)))
                        .find(|ordering| ordering.is_ne())
                        .unwrap_or_else(|| xs.len().cmp(&ys.len())),
                    _ => compare_values(a, b).unwrap_or(Ordering::Equal),
                })
        }
    }
}

fn float_sort_order(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
    }
}

/// Evaluates single terms against one record.
pub(crate) struct RecordEvaluator<'a> {
    record: &'a Record,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self { record }
    }

    pub fn matches(&mut self, term: &Term) -> bool {
        self.visit_term(term)
    }
}

impl<'a> ClauseVisitor for RecordEvaluator<'a> {
    type Output = bool;

    fn visit_literal(&mut self, field: &str, value: &Bson) -> bool {
        self.record
            .get(field)
            .is_some_and(|field_value| values_equal(field_value, value))
    }

    fn visit_pattern(&mut self, field: &str, pattern: &Pattern) -> bool {
        self.record
            .get(field)
            .is_some_and(|field_value| pattern.is_match(&textual_form(field_value)))
    }

    fn visit_operator(&mut self, field: &str, op: Operator, operand: &Bson) -> bool {
        let field_value = self.record.get(field);

        match op {
            Operator::Exists => is_considered_present(field_value) == is_truthy(operand),
            Operator::Ne => match field_value {
                None => true,
                Some(value) => !values_equal(value, operand),
            },
            _ => match (field_value, comparator(op)) {
                (Some(value), Some(compare)) => compare(value, operand),
                _ => false,
            },
        }
    }

    fn visit_or(&mut self, terms: &[Term]) -> bool {
        terms.iter().any(|term| match term.kind() {
            ClauseKind::Normal | ClauseKind::Conditional => self.visit_term(term),
            kind => {
                log::trace!("Skipping unsupported {kind:?} clause on {} inside $or", term.field);
                false
            }
        })
    }

    fn visit_inert(&mut self, _field: &str, _clause: &Clause) -> bool {
        true
    }
}

/// Runs queries against a slice of records.
///
/// Results are positions into the slice, in slice order, so callers can either copy
/// the matched records out or edit them in place by identity.
///
/// # Example
///
/// ```ignore
/// let positions = QueryEvaluator::new(&records).evaluate(&query);
/// let copies = QueryEvaluator::filter_records(&records, &query);
/// ```
pub struct QueryEvaluator<'a> {
    records: &'a [Record],
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(records: &'a [Record]) -> Self {
        Self { records }
    }

    /// Returns the positions of every record matching the query.
    ///
    /// An empty query matches everything. `Subdocument`, `Array` and `Unknown` terms are
    /// deliberate pass-through stages: they keep every candidate.
    pub fn evaluate(&self, query: &Query) -> Vec<usize> {
        let mut candidates = (0..self.records.len()).collect::<Vec<_>>();

        for term in query.terms() {
            if candidates.is_empty() {
                break;
            }

            let kind = term.kind();
            if kind.is_inert() {
                log::trace!("Pass-through {kind:?} stage on field {}", term.field);
                continue;
            }

            candidates = self.filter_stage(candidates, term);
            log::trace!("{kind:?} stage on field {} kept {} records", term.field, candidates.len());
        }

        candidates
    }

    /// Returns independent copies of every record matching the query.
    pub fn filter_records(records: &'a [Record], query: &Query) -> Vec<Record> {
        QueryEvaluator::new(records)
            .evaluate(query)
            .into_iter()
            .map(|position| records[position].clone())
            .collect()
    }

    fn filter_stage(&self, candidates: Vec<usize>, term: &Term) -> Vec<usize> {
        candidates
            .into_iter()
            .filter(|position| RecordEvaluator::new(&self.records[*position]).matches(term))
            .collect()
    }
}

/// Keeps the first record for each distinct value of `field`, in encounter order.
///
/// Records without the field, or where it is null, are skipped.
pub(crate) fn distinct_positions(records: &[Record], positions: Vec<usize>, field: &str) -> Vec<usize> {
    let mut seen: HashMap<String, Vec<&Bson>> = HashMap::new();
    let mut kept = Vec::new();

    for position in positions {
        let value = match records[position].get(field) {
            Some(Bson::Null) | None => continue,
            Some(value) => value,
        };

        let bucket = seen.entry(textual_form(value)).or_default();
        if bucket.iter().any(|other| values_equal(other, value)) {
            continue;
        }

        bucket.push(value);
        kept.push(position);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use queryable_core::query::Filter;

    fn find(records: &[Record], query: Document) -> Vec<Record> {
        QueryEvaluator::filter_records(records, &Query::parse(query).unwrap())
    }

    fn exists_fixture() -> Vec<Record> {
        vec![doc! { "a": 1, "b": 2 }, doc! { "b": 2, "c": 3 }, doc! { "c": 3, "d": 4 }]
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let records = exists_fixture();
        assert_eq!(find(&records, doc! {}), records);
    }

    #[test]
    fn test_literal_equality_is_type_strict() {
        let records = vec![doc! { "a": 1 }, doc! { "a": "1" }, doc! { "a": 1.0 }, doc! { "a": 1_i64 }];
        assert_eq!(find(&records, doc! { "a": 1 }), vec![doc! { "a": 1 }, doc! { "a": 1_i64 }]);
        assert_eq!(find(&records, doc! { "a": "1" }), vec![doc! { "a": "1" }]);
        assert_eq!(find(&records, doc! { "a": 1.0 }), vec![doc! { "a": 1.0 }]);
    }

    #[test]
    fn test_literal_requires_field() {
        let records = vec![doc! { "a": Bson::Null }, doc! { "b": 1 }];
        assert_eq!(find(&records, doc! { "a": Bson::Null }), vec![doc! { "a": Bson::Null }]);
    }

    #[test]
    fn test_conjunction_of_literals() {
        let records = vec![doc! { "a": 1, "b": 2, "c": 3, "d": 4 }, doc! { "a": 1, "b": 3 }];
        assert_eq!(
            find(&records, doc! { "a": 1, "b": 2, "c": 3, "d": 4 }),
            vec![doc! { "a": 1, "b": 2, "c": 3, "d": 4 }]
        );
    }

    #[test]
    fn test_pattern_matches_textual_form_from_start() {
        let records = vec![doc! { "s": "hello" }, doc! { "s": "say hello" }, doc! { "s": 123 }];
        let pattern = Query::builder()
            .filter(Filter::regex("s", Pattern::new("hel").unwrap()))
            .build();
        assert_eq!(QueryEvaluator::filter_records(&records, &pattern), vec![doc! { "s": "hello" }]);

        let digits = Query::builder()
            .filter(Filter::regex("s", Pattern::new("[0-9]+").unwrap()))
            .build();
        assert_eq!(QueryEvaluator::filter_records(&records, &digits), vec![doc! { "s": 123 }]);
    }

    #[test]
    fn test_exists_uses_truthiness() {
        let records = exists_fixture();
        assert_eq!(find(&records, doc! { "b": { "$exists": false } }), vec![doc! { "c": 3, "d": 4 }]);
        assert_eq!(
            find(&records, doc! { "b": { "$exists": false }, "c": { "$exists": false } }),
            Vec::<Record>::new()
        );
        assert_eq!(
            find(&records, doc! { "c": { "$exists": true } }),
            vec![doc! { "b": 2, "c": 3 }, doc! { "c": 3, "d": 4 }]
        );

        let falsy = vec![doc! { "a": 0 }, doc! { "a": "" }, doc! { "a": [] }, doc! { "a": false }, doc! { "a": 5 }];
        assert_eq!(find(&falsy, doc! { "a": { "$exists": true } }), vec![doc! { "a": 5 }]);
        assert_eq!(find(&falsy, doc! { "a": { "$exists": false } }).len(), 4);
    }

    #[test]
    fn test_ne_matches_absent_fields() {
        let records = vec![doc! { "a": 1 }, doc! { "a": 2 }, doc! { "b": 1 }, doc! { "a": 0 }];
        assert_eq!(
            find(&records, doc! { "a": { "$ne": 1 } }),
            vec![doc! { "a": 2 }, doc! { "b": 1 }, doc! { "a": 0 }]
        );
    }

    #[test]
    fn test_in_and_nin() {
        let records = vec![doc! { "a": 3 }, doc! { "a": 5 }, doc! { "b": 2 }, doc! { "a": 1 }];
        assert_eq!(find(&records, doc! { "a": { "$in": [2, 3, 5] } }), vec![doc! { "a": 3 }, doc! { "a": 5 }]);
        assert_eq!(find(&records, doc! { "a": { "$nin": [2, 3, 5] } }), vec![doc! { "a": 1 }]);
    }

    #[test]
    fn test_in_compares_numbers_by_value() {
        let records = vec![doc! { "a": 2.0 }, doc! { "a": 2_i64 }, doc! { "a": true }, doc! { "a": "2" }];
        assert_eq!(find(&records, doc! { "a": { "$in": [2] } }), vec![doc! { "a": 2.0 }, doc! { "a": 2_i64 }]);
        assert_eq!(find(&records, doc! { "a": { "$in": [1] } }), Vec::<Record>::new());
        assert_eq!(
            find(&records, doc! { "a": { "$nin": [2.0] } }),
            vec![doc! { "a": true }, doc! { "a": "2" }]
        );
    }

    #[test]
    fn test_in_with_scalar_operand() {
        let records = vec![doc! { "a": 3 }, doc! { "a": 4 }];
        assert_eq!(find(&records, doc! { "a": { "$in": 3 } }), vec![doc! { "a": 3 }]);
    }

    #[test]
    fn test_ordering_operators_respect_comparability() {
        let records = vec![
            doc! { "x": 1, "n": "one" },
            doc! { "x": 1.5, "n": "half" },
            doc! { "x": "two", "n": 2 },
        ];
        assert_eq!(find(&records, doc! { "x": { "$gt": 1 } }), vec![doc! { "x": 1.5, "n": "half" }]);
        assert_eq!(find(&records, doc! { "x": { "$lte": 1 } }), vec![doc! { "x": 1, "n": "one" }]);
        assert_eq!(find(&records, doc! { "x": { "$gte": "a" } }), vec![doc! { "x": "two", "n": 2 }]);
        assert_eq!(find(&records, doc! { "x": { "$lt": Bson::Null } }), Vec::<Record>::new());
    }

    #[test]
    fn test_eq_operator_is_guarded() {
        let records = vec![doc! { "a": 1 }, doc! { "a": 1.0 }, doc! { "a": true }, doc! { "a": Bson::Null }];
        assert_eq!(find(&records, doc! { "a": { "$eq": 1 } }), vec![doc! { "a": 1 }, doc! { "a": 1.0 }]);
        assert_eq!(find(&records, doc! { "a": { "$eq": true } }), Vec::<Record>::new());
        assert_eq!(find(&records, doc! { "a": { "$eq": Bson::Null } }), Vec::<Record>::new());
    }

    #[test]
    fn test_booleans_are_never_ordered() {
        let records = vec![doc! { "a": true }, doc! { "a": false }];
        assert_eq!(find(&records, doc! { "a": { "$gt": false } }), Vec::<Record>::new());
    }

    #[test]
    fn test_or_includes_each_record_once() {
        let records = vec![doc! { "a": 1 }, doc! { "b": 2 }, doc! { "c": 3 }, doc! { "a": 4 }];
        let query = Query::builder()
            .filter(Filter::or([
                Filter::regex("a", Pattern::new(".*").unwrap()),
                Filter::eq("b", 2),
            ]))
            .build();
        assert_eq!(
            QueryEvaluator::filter_records(&records, &query),
            vec![doc! { "a": 1 }, doc! { "b": 2 }, doc! { "a": 4 }]
        );
    }

    #[test]
    fn test_or_with_conditionals() {
        let records = vec![doc! { "a": 1 }, doc! { "a": 7 }, doc! { "b": 3 }, doc! { "b": 0 }];
        assert_eq!(
            find(&records, doc! { "$or": [{ "a": { "$gt": 5 } }, { "b": { "$exists": true } }] }),
            vec![doc! { "a": 7 }, doc! { "b": 3 }]
        );
    }

    #[test]
    fn test_or_ignores_unsupported_sub_clauses() {
        let records = vec![doc! { "a": 1 }, doc! { "a": 2 }];
        assert_eq!(
            find(&records, doc! { "$or": [{ "a": [1] }, { "$or": [{ "a": 1 }] }, { "a": 2 }] }),
            vec![doc! { "a": 2 }]
        );
    }

    #[test]
    fn test_or_requires_field_like_top_level_terms() {
        let records = vec![doc! { "a": Bson::Null }, doc! { "a": 1 }, doc! { "b": 1 }];
        assert_eq!(
            find(&records, doc! { "$or": [{ "a": Bson::Null }] }),
            vec![doc! { "a": Bson::Null }]
        );
        assert_eq!(
            find(&records, doc! { "$or": [{ "a": { "$nin": [1] } }] }),
            vec![doc! { "a": Bson::Null }]
        );
        assert_eq!(
            find(&records, doc! { "$or": [{ "a": { "$nin": [1] } }] }),
            find(&records, doc! { "a": { "$nin": [1] } })
        );
    }

    #[test]
    fn test_inert_clauses_pass_through() {
        let records = vec![doc! { "a": 1 }, doc! { "b": 2 }];
        assert_eq!(find(&records, doc! { "a": "x.y" }), records);
        assert_eq!(find(&records, doc! { "a": [1, 2] }), records);
        assert_eq!(find(&records, doc! { "a": { "nested": 1 } }), records);
        assert_eq!(find(&records, doc! { "a": "x.y", "b": 2 }), vec![doc! { "b": 2 }]);
    }

    #[test]
    fn test_term_order_does_not_change_results() {
        let records = vec![
            doc! { "a": 1, "b": 5 },
            doc! { "a": 2, "b": 5 },
            doc! { "a": 1, "b": 6 },
        ];
        let forward = find(&records, doc! { "a": 1, "b": { "$lt": 6 } });
        let backward = find(&records, doc! { "b": { "$lt": 6 }, "a": 1 });
        assert_eq!(forward, backward);
        assert_eq!(forward, vec![doc! { "a": 1, "b": 5 }]);
    }

    #[test]
    fn test_comparator_table_covers_ordering_and_membership() {
        for op in Operator::ALL {
            let expected = !matches!(op, Operator::Exists | Operator::Ne);
            assert_eq!(comparator(op).is_some(), expected, "{op}");
        }
    }

    #[test]
    fn test_int_and_float_compare_exactly() {
        let big = Bson::Int64((1_i64 << 53) + 1);
        let rounded = Bson::Double((1_i64 << 53) as f64);
        assert_eq!(compare_values(&big, &rounded), Some(Ordering::Greater));
        assert_eq!(compare_values(&rounded, &big), Some(Ordering::Less));
        assert_eq!(compare_values(&Bson::Int32(2), &Bson::Double(2.5)), Some(Ordering::Less));
        assert_eq!(compare_values(&Bson::Int32(-2), &Bson::Double(-2.5)), Some(Ordering::Greater));
        assert_eq!(compare_values(&Bson::Int64(i64::MAX), &Bson::Double(1e19)), Some(Ordering::Less));
        assert_eq!(compare_values(&Bson::Int32(3), &Bson::Double(3.0)), Some(Ordering::Equal));
        assert_eq!(compare_values(&Bson::Int32(3), &Bson::Double(f64::NAN)), None);
    }

    #[test]
    fn test_is_comparable() {
        assert!(is_comparable(&Bson::Int32(1), &Bson::Double(2.0)));
        assert!(is_comparable(&Bson::String("a".into()), &Bson::String("b".into())));
        assert!(!is_comparable(&Bson::String("a".into()), &Bson::Int32(1)));
        assert!(!is_comparable(&Bson::Null, &Bson::Null));
        assert!(!is_comparable(&Bson::Boolean(true), &Bson::Boolean(true)));
    }

    #[test]
    fn test_presence_helpers_differ_on_falsy_values() {
        let zero = Bson::Int32(0);
        assert!(!is_considered_present(Some(&zero)));
        assert!(is_strictly_present(Some(&zero)));
        assert!(!is_considered_present(None));
    }

    #[test]
    fn test_sort_order_ranks_types() {
        let values = [Bson::String("a".into()), Bson::Int32(2), Bson::Null, Bson::Double(1.5), Bson::Boolean(true)];
        let mut sorted = values.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| sort_order(Some(a), Some(b)));
        assert_eq!(
            sorted,
            vec![&Bson::Null, &Bson::Boolean(true), &Bson::Double(1.5), &Bson::Int32(2), &Bson::String("a".into())]
        );
        assert_eq!(sort_order(None, Some(&Bson::Null)), Ordering::Less);
    }

    #[test]
    fn test_sort_order_puts_nan_after_numbers() {
        let nan = Bson::Double(f64::NAN);
        assert_eq!(sort_order(Some(&nan), Some(&Bson::Int32(1))), Ordering::Greater);
        assert_eq!(sort_order(Some(&Bson::Double(1e300)), Some(&nan)), Ordering::Less);
        assert_eq!(sort_order(Some(&nan), Some(&nan)), Ordering::Equal);
        assert_eq!(sort_order(Some(&nan), Some(&Bson::String("a".into()))), Ordering::Less);
    }

    #[test]
    fn test_pattern_sees_booleans_and_null_by_name() {
        let records = vec![doc! { "a": true }, doc! { "a": false }, doc! { "a": Bson::Null }, doc! { "a": 2.0 }];
        let query = |source: &str| {
            Query::builder()
                .filter(Filter::regex("a", Pattern::new(source).unwrap()))
                .build()
        };
        assert_eq!(QueryEvaluator::filter_records(&records, &query("T")), vec![doc! { "a": true }]);
        assert_eq!(QueryEvaluator::filter_records(&records, &query("None")), vec![doc! { "a": Bson::Null }]);
        assert_eq!(QueryEvaluator::filter_records(&records, &query(r"2\.0")), vec![doc! { "a": 2.0 }]);
    }

    #[test]
    fn test_distinct_positions_keep_first_occurrence() {
        let records = vec![doc! { "a": 1 }, doc! { "a": 0 }, doc! { "a": 1 }, doc! { "a": 0 }, doc! { "b": 1 }];
        assert_eq!(distinct_positions(&records, (0..5).collect(), "a"), vec![0, 1]);

        let mixed = vec![doc! { "a": 1 }, doc! { "a": "1" }, doc! { "a": 1_i64 }, doc! { "a": Bson::Null }];
        assert_eq!(distinct_positions(&mixed, (0..4).collect(), "a"), vec![0, 1]);
    }
}
