//! Query model and clause classification.
//!
//! A [`Query`] is an ordered list of [`Term`]s, each pairing a field name with a
//! [`Clause`]. Top-level terms are conjunctive. Queries are usually parsed from a
//! Mongo-like document, where each value is classified exactly once by [`classify`]
//! and turned into a closed clause variant:
//!
//! | value shape | kind | clause |
//! |---|---|---|
//! | boolean, integer, float, null, regular expression | `Normal` | `Literal` / `Pattern` |
//! | `{"$regex": .., "$options": ..}` | `Normal` | `Pattern` |
//! | text without `.` | `Normal` | `Literal` |
//! | text containing `.` | `Subdocument` | `Subdocument` |
//! | `{op: operand}` with a recognized operator | `Conditional` | `Operator` |
//! | any other mapping | `Subdocument` | `Subdocument` |
//! | sequence under `$or` | `Or` | `Or` |
//! | any other sequence | `Array` | `Array` |
//! | anything else | `Unknown` | `Unknown` |
//!
//! `Subdocument`, `Array` and `Unknown` clauses are recognized but never matched:
//! evaluators treat them as pass-through stages.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use queryable_core::query::{Filter, Query};
//!
//! let parsed = Query::parse(doc! { "age": { "$gt": 18 }, "name": "Alice" })?;
//!
//! let built = Query::builder()
//!     .filter(Filter::gt("age", 18))
//!     .filter(Filter::eq("name", "Alice"))
//!     .build();
//! ```

use std::fmt::{self, Display};

use bson::{Bson, Document, doc};
use regex::Regex;
use serde_json::Value;

use crate::{
    codec::json_to_bson,
    error::{StoreError, StoreResult},
};

/// Field key that introduces a disjunction.
pub const OR_KEY: &str = "$or";

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl From<i32> for SortDirection {
    /// Negative values sort descending, everything else ascending.
    fn from(direction: i32) -> Self {
        if direction < 0 {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// The shape of a clause, as decided by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    /// Equality or pattern match against a single field.
    Normal,
    /// Dotted-path text or a non-operator mapping. Recognized, never matched.
    Subdocument,
    /// A single-key `{operator: operand}` mapping.
    Conditional,
    /// A sequence of sub-clauses under the `$or` key.
    Or,
    /// A bare sequence under an ordinary field. Recognized, never matched.
    Array,
    /// Any other value type. Never matched.
    Unknown,
}

impl ClauseKind {
    /// Returns `true` for kinds that evaluators skip without filtering.
    pub fn is_inert(&self) -> bool {
        matches!(self, ClauseKind::Subdocument | ClauseKind::Array | ClauseKind::Unknown)
    }
}

/// Conditional operators understood inside an `{operator: operand}` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Field is present and truthy (or not, when the operand is falsy).
    Exists,
    /// Field is absent or differs from the operand.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Equal to, restricted to comparable values.
    Eq,
    /// Field value is a member of the operand sequence.
    In,
    /// Field value is not a member of the operand sequence.
    Nin,
}

impl Operator {
    /// Every recognized operator.
    pub const ALL: [Operator; 9] = [
        Operator::Exists,
        Operator::Ne,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::Eq,
        Operator::In,
        Operator::Nin,
    ];

    /// Looks up an operator by its `$`-prefixed name.
    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Returns the `$`-prefixed name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Exists => "$exists",
            Operator::Ne => "$ne",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Eq => "$eq",
            Operator::In => "$in",
            Operator::Nin => "$nin",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled regular expression matched against the textual form of a field.
///
/// Matching is anchored at the start of the text but not at the end, so `abc`
/// matches `"abcdef"` and `.*` matches everything.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    options: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern with no options.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] if the pattern does not compile.
    pub fn new(source: impl Into<String>) -> StoreResult<Self> {
        Self::with_options(source, "")
    }

    /// Compiles a pattern with Mongo-style option letters.
    ///
    /// `i`, `m`, `s` and `x` become the corresponding inline flags; other letters are ignored.
    pub fn with_options(source: impl Into<String>, options: impl Into<String>) -> StoreResult<Self> {
        let source = source.into();
        let options = options
            .into()
            .chars()
            .filter(|c| matches!(c, 'i' | 'm' | 's' | 'x'))
            .collect::<String>();

        let anchored = if options.is_empty() {
            format!(r"\A(?:{source})")
        } else {
            format!(r"\A(?{options}:{source})")
        };

        Ok(Self {
            regex: Regex::new(&anchored)?,
            source,
            options,
        })
    }

    /// Returns the pattern as written, without the start anchor.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the option letters that were applied.
    pub fn options(&self) -> &str {
        &self.options
    }

    /// Tests whether the text starts with a match of this pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.options == other.options
    }
}

/// The matching condition attached to one field of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact, type-strict equality.
    Literal(Bson),
    /// Start-anchored regular expression over the field's textual form.
    Pattern(Pattern),
    /// `{operator: operand}` condition.
    Operator(Operator, Bson),
    /// Matches when any sub-term matches.
    Or(Vec<Term>),
    /// Dotted path or nested mapping. Recognized, never matched.
    Subdocument(Bson),
    /// Bare sequence. Recognized, never matched.
    Array(Vec<Bson>),
    /// Unsupported value type. Never matched.
    Unknown(Bson),
}

impl Clause {
    /// Returns the kind this clause was classified as.
    pub fn kind(&self) -> ClauseKind {
        match self {
            Clause::Literal(_) | Clause::Pattern(_) => ClauseKind::Normal,
            Clause::Operator(..) => ClauseKind::Conditional,
            Clause::Or(_) => ClauseKind::Or,
            Clause::Subdocument(_) => ClauseKind::Subdocument,
            Clause::Array(_) => ClauseKind::Array,
            Clause::Unknown(_) => ClauseKind::Unknown,
        }
    }

    /// Classifies a raw clause value and builds the matching clause.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] if a pattern does not compile.
    pub fn parse(field: &str, value: Bson) -> StoreResult<Clause> {
        match (classify(field, &value), value) {
            (ClauseKind::Normal, Bson::RegularExpression(regex)) => Ok(Clause::Pattern(
                Pattern::with_options(regex.pattern.as_str(), regex.options.as_str())?,
            )),
            (ClauseKind::Normal, Bson::Document(doc)) => {
                Ok(Clause::Pattern(regex_document_pattern(&doc)?))
            }
            (ClauseKind::Normal, value) => Ok(Clause::Literal(value)),
            (ClauseKind::Conditional, Bson::Document(doc)) => {
                let operator = doc
                    .into_iter()
                    .next()
                    .and_then(|(name, operand)| Operator::from_name(&name).map(|op| (op, operand)));

                match operator {
                    Some((op, operand)) => Ok(Clause::Operator(op, operand)),
                    None => Err(StoreError::InvalidQuery(format!(
                        "malformed operator clause for field {field}"
                    ))),
                }
            }
            (ClauseKind::Or, Bson::Array(items)) => Ok(Clause::Or(parse_disjunction(items)?)),
            (ClauseKind::Array, Bson::Array(items)) => Ok(Clause::Array(items)),
            (ClauseKind::Subdocument, value) => Ok(Clause::Subdocument(value)),
            (_, value) => Ok(Clause::Unknown(value)),
        }
    }
}

/// Decides the kind of a clause value from its runtime shape.
///
/// The rules are applied in order; see the module documentation for the full table.
pub fn classify(field: &str, value: &Bson) -> ClauseKind {
    match value {
        Bson::Boolean(_)
        | Bson::Int32(_)
        | Bson::Int64(_)
        | Bson::Double(_)
        | Bson::Null
        | Bson::RegularExpression(_) => ClauseKind::Normal,
        Bson::String(text) if text.contains('.') => ClauseKind::Subdocument,
        Bson::String(_) => ClauseKind::Normal,
        Bson::Document(doc) if is_regex_document(doc) => ClauseKind::Normal,
        Bson::Document(doc) => {
            let mut keys = doc.keys();
            match (keys.next(), keys.next()) {
                (Some(key), None) if Operator::from_name(key).is_some() => ClauseKind::Conditional,
                _ => ClauseKind::Subdocument,
            }
        }
        Bson::Array(_) if field == OR_KEY => ClauseKind::Or,
        Bson::Array(_) => ClauseKind::Array,
        _ => ClauseKind::Unknown,
    }
}

fn is_regex_document(doc: &Document) -> bool {
    matches!(doc.get("$regex"), Some(Bson::String(_)))
        && doc.keys().all(|k| k == "$regex" || k == "$options")
        && !matches!(doc.get("$options"), Some(value) if value.as_str().is_none())
}

fn regex_document_pattern(doc: &Document) -> StoreResult<Pattern> {
    Pattern::with_options(
        doc.get_str("$regex").unwrap_or_default(),
        doc.get_str("$options").unwrap_or_default(),
    )
}

fn parse_disjunction(items: Vec<Bson>) -> StoreResult<Vec<Term>> {
    let mut terms = Vec::with_capacity(items.len());

    for item in items {
        let entry = match item {
            Bson::Document(doc) => doc.into_iter().next(),
            other => {
                log::warn!("Ignoring $or entry that is not a mapping: {other}");
                continue;
            }
        };

        match entry {
            Some((field, value)) => {
                let clause = Clause::parse(&field, value)?;
                terms.push(Term { field, clause });
            }
            None => log::warn!("Ignoring empty $or entry"),
        }
    }

    Ok(terms)
}

/// One field/clause pair of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// The field the clause applies to (`$or` for disjunctions).
    pub field: String,
    /// The matching condition.
    pub clause: Clause,
}

impl Term {
    /// Creates a term from an already-built clause.
    pub fn new(field: impl Into<String>, clause: Clause) -> Self {
        Self { field: field.into(), clause }
    }

    /// Returns the kind of this term's clause.
    pub fn kind(&self) -> ClauseKind {
        self.clause.kind()
    }
}

/// A conjunctive, ordered list of terms.
///
/// An empty query matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Query { terms: Vec::new() }
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Parses a query document, classifying each value once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] if a pattern does not compile.
    pub fn parse(document: Document) -> StoreResult<Self> {
        Ok(Query {
            terms: document
                .into_iter()
                .map(|(field, value)| {
                    Clause::parse(&field, value).map(|clause| Term { field, clause })
                })
                .collect::<StoreResult<Vec<_>>>()?,
        })
    }

    /// Parses a query from a JSON object. Patterns use the `{"$regex": ..}` form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] if the value is not an object or a pattern
    /// does not compile.
    pub fn parse_json(value: Value) -> StoreResult<Self> {
        match json_to_bson(value) {
            Bson::Document(document) => Self::parse(document),
            other => Err(StoreError::InvalidQuery(format!(
                "expected a JSON object, found {:?}",
                other.element_type()
            ))),
        }
    }

    /// Returns the terms in evaluation order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Returns `true` if the query has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Renders the query back into its document form.
    pub fn to_document(&self) -> Document {
        let mut renderer = QueryRenderer;

        self.terms
            .iter()
            .map(|term| (term.field.clone(), renderer.visit_term(term)))
            .collect()
    }
}

impl TryFrom<Document> for Query {
    type Error = StoreError;

    fn try_from(document: Document) -> StoreResult<Self> {
        Query::parse(document)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

/// Helper struct for constructing terms without going through a query document.
///
/// Unlike the document form, [`Filter::eq`] never reclassifies its value: the
/// resulting term always compares for equality, even for dotted text.
///
/// # Example
///
/// ```ignore
/// use queryable_core::query::Filter;
///
/// let adults = Filter::or([Filter::gte("age", 18), Filter::exists("guardian")]);
/// ```
pub struct Filter;

impl Filter {
    /// Matches records whose field equals the value, type-strictly.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Term {
        Term::new(field, Clause::Literal(value.into()))
    }

    /// Matches records whose field's textual form starts with a match of the pattern.
    pub fn regex(field: impl Into<String>, pattern: Pattern) -> Term {
        Term::new(field, Clause::Pattern(pattern))
    }

    /// Builds an `{operator: operand}` term.
    pub fn op(field: impl Into<String>, op: Operator, operand: impl Into<Bson>) -> Term {
        Term::new(field, Clause::Operator(op, operand.into()))
    }

    /// Matches records that lack the field or whose field differs from the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Term {
        Self::op(field, Operator::Ne, value)
    }

    /// Matches records whose field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Term {
        Self::op(field, Operator::Gt, value)
    }

    /// Matches records whose field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Term {
        Self::op(field, Operator::Gte, value)
    }

    /// Matches records whose field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Term {
        Self::op(field, Operator::Lt, value)
    }

    /// Matches records whose field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Term {
        Self::op(field, Operator::Lte, value)
    }

    /// Matches records whose field is present and truthy.
    pub fn exists(field: impl Into<String>) -> Term {
        Self::op(field, Operator::Exists, true)
    }

    /// Matches records whose field is absent or falsy.
    pub fn not_exists(field: impl Into<String>) -> Term {
        Self::op(field, Operator::Exists, false)
    }

    /// Matches records whose field is one of the values.
    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Term {
        Self::op(field, Operator::In, values.into_iter().map(Into::into).collect::<Vec<Bson>>())
    }

    /// Matches records whose field is none of the values.
    pub fn not_in(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Term {
        Self::op(field, Operator::Nin, values.into_iter().map(Into::into).collect::<Vec<Bson>>())
    }

    /// Matches records for which any of the terms matches.
    pub fn or(terms: impl IntoIterator<Item = Term>) -> Term {
        Term::new(OR_KEY, Clause::Or(terms.into_iter().collect()))
    }
}

/// Fluent builder for [`Query`] instances.
///
/// # Example
///
/// ```ignore
/// let query = Query::builder()
///     .filter(Filter::gte("age", 21))
///     .filter(Filter::or([Filter::eq("role", "admin"), Filter::exists("invited_by")]))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Appends a term. Terms are evaluated in the order they are added.
    pub fn filter(mut self, term: Term) -> Self {
        self.query.terms.push(term);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks the clauses of a query.
///
/// [`ClauseVisitor::visit_term`] dispatches on the clause variant; inert clauses
/// (`Subdocument`, `Array`, `Unknown`) all go to [`ClauseVisitor::visit_inert`].
pub trait ClauseVisitor {
    type Output;

    fn visit_literal(&mut self, field: &str, value: &Bson) -> Self::Output;
    fn visit_pattern(&mut self, field: &str, pattern: &Pattern) -> Self::Output;
    fn visit_operator(&mut self, field: &str, op: Operator, operand: &Bson) -> Self::Output;
    fn visit_or(&mut self, terms: &[Term]) -> Self::Output;
    fn visit_inert(&mut self, field: &str, clause: &Clause) -> Self::Output;

    fn visit_term(&mut self, term: &Term) -> Self::Output {
        match &term.clause {
            Clause::Literal(value) => self.visit_literal(&term.field, value),
            Clause::Pattern(pattern) => self.visit_pattern(&term.field, pattern),
            Clause::Operator(op, operand) => self.visit_operator(&term.field, *op, operand),
            Clause::Or(terms) => self.visit_or(terms),
            clause => self.visit_inert(&term.field, clause),
        }
    }
}

/// Renders clauses back into the value half of a query document.
struct QueryRenderer;

impl ClauseVisitor for QueryRenderer {
    type Output = Bson;

    fn visit_literal(&mut self, _field: &str, value: &Bson) -> Bson {
        value.clone()
    }

    fn visit_pattern(&mut self, _field: &str, pattern: &Pattern) -> Bson {
        if pattern.options().is_empty() {
            Bson::Document(doc! { "$regex": pattern.as_str() })
        } else {
            Bson::Document(doc! { "$regex": pattern.as_str(), "$options": pattern.options() })
        }
    }

    fn visit_operator(&mut self, _field: &str, op: Operator, operand: &Bson) -> Bson {
        let mut rendered = Document::new();
        rendered.insert(op.name(), operand.clone());
        Bson::Document(rendered)
    }

    fn visit_or(&mut self, terms: &[Term]) -> Bson {
        Bson::Array(
            terms
                .iter()
                .map(|term| {
                    let mut rendered = Document::new();
                    rendered.insert(term.field.clone(), self.visit_term(term));
                    Bson::Document(rendered)
                })
                .collect(),
        )
    }

    fn visit_inert(&mut self, _field: &str, clause: &Clause) -> Bson {
        match clause {
            Clause::Subdocument(value) | Clause::Unknown(value) => value.clone(),
            Clause::Array(items) => Bson::Array(items.clone()),
            _ => Bson::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;
    use serde_json::json;

    #[test]
    fn test_classify_scalars_are_normal() {
        for value in [Bson::Boolean(true), Bson::Int32(1), Bson::Int64(1), Bson::Double(1.5), Bson::Null] {
            assert_eq!(classify("a", &value), ClauseKind::Normal);
        }
        assert_eq!(classify("a", &Bson::String("plain".into())), ClauseKind::Normal);
    }

    #[test]
    fn test_classify_dotted_text_is_subdocument() {
        assert_eq!(classify("a", &Bson::String("b.c".into())), ClauseKind::Subdocument);
    }

    #[test]
    fn test_classify_mappings() {
        assert_eq!(classify("a", &Bson::Document(doc! { "$gt": 1 })), ClauseKind::Conditional);
        assert_eq!(classify("a", &Bson::Document(doc! { "$exists": true })), ClauseKind::Conditional);
        assert_eq!(classify("a", &Bson::Document(doc! { "$bogus": 1 })), ClauseKind::Subdocument);
        assert_eq!(classify("a", &Bson::Document(doc! { "b": 1 })), ClauseKind::Subdocument);
        assert_eq!(
            classify("a", &Bson::Document(doc! { "$gt": 1, "$lt": 5 })),
            ClauseKind::Subdocument
        );
        assert_eq!(classify("a", &Bson::Document(doc! {})), ClauseKind::Subdocument);
        assert_eq!(classify("a", &Bson::Document(doc! { "$regex": "^x" })), ClauseKind::Normal);
    }

    #[test]
    fn test_classify_sequences() {
        let items = Bson::Array(vec![Bson::Int32(1)]);
        assert_eq!(classify("$or", &items), ClauseKind::Or);
        assert_eq!(classify("a", &items), ClauseKind::Array);
    }

    #[test]
    fn test_classify_other_types_are_unknown() {
        assert_eq!(classify("a", &Bson::DateTime(DateTime::now())), ClauseKind::Unknown);
    }

    #[test]
    fn test_operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.name()), Some(op));
        }
        assert_eq!(Operator::from_name("$regex"), None);
    }

    #[test]
    fn test_pattern_is_prefix_anchored() {
        let pattern = Pattern::new("ab").unwrap();
        assert!(pattern.is_match("abc"));
        assert!(!pattern.is_match("cab"));

        let pattern = Pattern::new("x$").unwrap();
        assert!(!pattern.is_match("yx"));
        assert!(pattern.is_match("x"));
    }

    #[test]
    fn test_pattern_alternation_stays_anchored() {
        let pattern = Pattern::new("a|b").unwrap();
        assert!(pattern.is_match("b1"));
        assert!(!pattern.is_match("cb"));
    }

    #[test]
    fn test_pattern_options() {
        let pattern = Pattern::with_options("abc", "iu").unwrap();
        assert!(pattern.is_match("ABCdef"));
        assert_eq!(pattern.options(), "i");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(Pattern::new("("), Err(StoreError::InvalidQuery(_))));
        assert!(Query::parse(doc! { "a": { "$regex": "(" } }).is_err());
    }

    #[test]
    fn test_parse_builds_variants() {
        let query = Query::parse(doc! {
            "a": 1,
            "b": { "$in": [1, 2] },
            "c": "x.y",
            "d": [1, 2],
            "$or": [{ "e": { "$regex": "^z" } }, { "f": { "$ne": 3 } }],
        })
        .unwrap();

        let kinds = query.terms().iter().map(Term::kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ClauseKind::Normal,
                ClauseKind::Conditional,
                ClauseKind::Subdocument,
                ClauseKind::Array,
                ClauseKind::Or,
            ]
        );

        match &query.terms()[4].clause {
            Clause::Or(terms) => {
                assert_eq!(terms.len(), 2);
                assert_eq!(terms[0].kind(), ClauseKind::Normal);
                assert_eq!(terms[1].clause, Clause::Operator(Operator::Ne, Bson::Int32(3)));
            }
            other => panic!("expected a disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_skips_malformed_disjunction_entries() {
        let query = Query::parse(doc! { "$or": [1, {}, { "a": 1 }] }).unwrap();
        match &query.terms()[0].clause {
            Clause::Or(terms) => assert_eq!(terms, &vec![Filter::eq("a", 1)]),
            other => panic!("expected a disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_matches_parsed_form() {
        let built = Query::builder()
            .filter(Filter::eq("a", 1))
            .filter(Filter::gt("b", 2))
            .filter(Filter::or([Filter::exists("c"), Filter::is_in("d", [1, 2])]))
            .build();
        let parsed = Query::parse(doc! {
            "a": 1,
            "b": { "$gt": 2 },
            "$or": [{ "c": { "$exists": true } }, { "d": { "$in": [1, 2] } }],
        })
        .unwrap();

        assert_eq!(built, parsed);
    }

    #[test]
    fn test_render_round_trip() {
        let document = doc! {
            "a": { "$regex": "^x", "$options": "i" },
            "b": { "$lte": 4 },
            "c": "d.e",
        };
        let query = Query::parse(document.clone()).unwrap();
        assert_eq!(query.to_document(), document);
        assert_eq!(Query::parse(query.to_document()).unwrap(), query);
    }

    #[test]
    fn test_parse_json() {
        let query = Query::parse_json(json!({ "a": { "$gt": 1 } })).unwrap();
        assert_eq!(query.terms()[0].clause, Clause::Operator(Operator::Gt, Bson::Int64(1)));
        assert!(Query::parse_json(json!([1])).is_err());
    }

    #[test]
    fn test_sort_direction_from_integer() {
        assert_eq!(SortDirection::from(-1), SortDirection::Desc);
        assert_eq!(SortDirection::from(0), SortDirection::Asc);
        assert_eq!(SortDirection::from(1), SortDirection::Asc);
    }
}
