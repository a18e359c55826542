//! Condition accumulation for dynamic queries.
//!
//! This module provides [`ComparisonKind`] (operator tag) and [`ConditionSet`],
//! the stateful accumulator behind the fluent builder surface: one predicate
//! group per comparison kind, a projection column set, and an opaque ordering
//! directive. The accumulator never touches the execution collaborator; it is
//! compiled into SQL by [`crate::sql::compile`].

use crate::error::{MapperError, MapperResult};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Separator for the string form of IN / NOT IN values.
pub const LIST_SEPARATOR: char = ',';

/// Comparison kind for a predicate group.
///
/// The `Ord` impl (declaration order) is the fixed emission order of the
/// compiler: all conjunctive kinds first, the disjunctive `Or` group last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComparisonKind {
    /// column = value
    Eq,
    /// column != value
    Ne,
    /// column IN (values...)
    In,
    /// column NOT IN (values...)
    NotIn,
    /// column < value
    Lt,
    /// column > value
    Gt,
    /// column <= value
    Lte,
    /// column >= value
    Gte,
    /// column LIKE pattern (wildcard-wrapped at compile time)
    Like,
    /// column IS NULL
    IsNull,
    /// OR column = value (trailing disjunctive group)
    Or,
}

impl ComparisonKind {
    /// Parameter alias prefix for this kind, used to keep aliases unique
    /// across predicate groups.
    pub fn alias_prefix(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::In => "IN",
            Self::NotIn => "NIN",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Lte => "LTE",
            Self::Gte => "GTE",
            Self::Like => "LIKE",
            Self::IsNull => "NULL",
            Self::Or => "OR",
        }
    }

    /// SQL operator text for this kind.
    pub fn operator(self) -> &'static str {
        match self {
            Self::Eq | Self::Or => "=",
            Self::Ne => "!=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
        }
    }

    /// Whether fragments of this kind join with OR instead of AND.
    pub fn is_disjunctive(self) -> bool {
        matches!(self, Self::Or)
    }
}

/// Accumulated query intent: predicate groups, projection, ordering.
///
/// Groups are created lazily per kind on first use. Within one accumulation
/// session each (kind, column) pair holds a single value; a repeated call
/// overwrites the prior value (last write wins). BTreeMaps keep iteration
/// deterministic so repeated compilation yields byte-identical SQL.
///
/// Single value per call site: one `ConditionSet` feeds one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    groups: BTreeMap<ComparisonKind, BTreeMap<String, Value>>,
    projection: BTreeSet<String>,
    order_by: Option<String>,
}

impl ConditionSet {
    /// Create an empty condition set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a predicate under the given kind, overwriting any prior value
    /// for the same (kind, column) pair.
    pub(crate) fn push(&mut self, kind: ComparisonKind, column: &str, value: Value) {
        self.groups
            .entry(kind)
            .or_default()
            .insert(column.to_string(), value);
    }

    // ==================== Fluent predicate methods ====================

    /// Add: column = value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Eq, column, value.into());
        self
    }

    /// Add: column != value
    pub fn ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Ne, column, value.into());
        self
    }

    /// Add: column < value
    pub fn lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Lt, column, value.into());
        self
    }

    /// Add: column > value
    pub fn gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Gt, column, value.into());
        self
    }

    /// Add: column <= value
    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Lte, column, value.into());
        self
    }

    /// Add: column >= value
    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Gte, column, value.into());
        self
    }

    /// Add: column LIKE pattern (the compiler wraps the value in wildcards)
    pub fn like(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Like, column, value.into());
        self
    }

    /// Add a trailing disjunctive predicate: OR column = value
    pub fn or_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(ComparisonKind::Or, column, value.into());
        self
    }

    /// Add: column IS NULL
    pub fn is_null(mut self, column: &str) -> Self {
        self.push(ComparisonKind::IsNull, column, Value::Null);
        self
    }

    /// Add: column IN (values...)
    pub fn in_list<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.push(ComparisonKind::In, column, Value::Array(values));
        self
    }

    /// Add: column NOT IN (values...)
    pub fn not_in<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.push(ComparisonKind::NotIn, column, Value::Array(values));
        self
    }

    /// Add: column IN (values...) from a comma-separated string.
    ///
    /// Blank input is rejected at the call site with
    /// [`MapperError::InvalidArgument`].
    pub fn in_str(mut self, column: &str, raw: &str) -> MapperResult<Self> {
        let values = split_list(raw)?;
        self.push(ComparisonKind::In, column, Value::Array(values));
        Ok(self)
    }

    /// Add: column NOT IN (values...) from a comma-separated string.
    pub fn not_in_str(mut self, column: &str, raw: &str) -> MapperResult<Self> {
        let values = split_list(raw)?;
        self.push(ComparisonKind::NotIn, column, Value::Array(values));
        Ok(self)
    }

    /// Add: column >= low AND column <= high
    ///
    /// Sugar for `gte` + `lte` on the same column; no range validation.
    pub fn between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.gte(column, low).lte(column, high)
    }

    // ==================== Projection & ordering ====================

    /// Add one output column to the projection.
    ///
    /// An empty name is rejected with [`MapperError::InvalidArgument`].
    pub fn field(mut self, column: &str) -> MapperResult<Self> {
        if column.trim().is_empty() {
            return Err(MapperError::invalid_argument("projection column is empty"));
        }
        self.projection.insert(column.to_string());
        Ok(self)
    }

    /// Add multiple output columns to the projection.
    pub fn fields<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.projection.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Store a raw ordering directive, replacing any prior one.
    ///
    /// The directive is opaque: the compiler carries it through verbatim and
    /// the execution collaborator consumes it.
    pub fn order_by(mut self, expression: &str) -> Self {
        self.order_by = Some(expression.to_string());
        self
    }

    // ==================== Accessors ====================

    /// Iterate predicate groups in fixed emission order.
    pub(crate) fn groups(&self) -> &BTreeMap<ComparisonKind, BTreeMap<String, Value>> {
        &self.groups
    }

    /// Whether any predicate group mentions the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.groups.values().any(|group| group.contains_key(column))
    }

    /// Projection columns in deterministic order.
    pub fn projection(&self) -> impl Iterator<Item = &str> {
        self.projection.iter().map(String::as_str)
    }

    /// The active ordering directive, if any.
    pub fn ordering(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    /// Detach the ordering directive (used by the paginate protocol so the
    /// count round trip carries no ordering).
    pub(crate) fn take_ordering(&mut self) -> Option<String> {
        self.order_by.take()
    }

    /// Re-attach a previously detached ordering directive.
    pub(crate) fn restore_ordering(&mut self, expression: Option<String>) {
        self.order_by = expression;
    }

    /// True when no predicate has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }
}

/// Split the string form of IN values on [`LIST_SEPARATOR`].
fn split_list(raw: &str) -> MapperResult<Vec<Value>> {
    if raw.trim().is_empty() {
        return Err(MapperError::invalid_argument("in values must not be empty"));
    }
    Ok(raw
        .split(LIST_SEPARATOR)
        .map(|part| Value::String(part.to_string()))
        .collect())
}
