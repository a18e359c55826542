//! WHERE-fragment compilation.
//!
//! [`compile`] is a stateless transform from an accumulated [`ConditionSet`]
//! plus optional by-example (column, value) pairs into a [`CompiledCondition`]:
//! the WHERE-clause body, a named-parameter [`Bindings`] map, and the ordering
//! directive carried through verbatim.
//!
//! Every fragment carries its leading boolean keyword (`AND ` / `OR `); the
//! consumer strips or keeps the first keyword as its SQL template requires.
//! Parameter aliases are prefixed with the kind name (`EQ_`, `IN_`, ...) so
//! the same column can appear under several kinds without collisions.

use crate::condition::{ComparisonKind, ConditionSet};
use serde_json::Value;
use tracing::debug;

/// Ordered alias → value map for named SQL parameters.
///
/// Insertion order is fragment emission order. Alias uniqueness within one
/// compiled condition is guaranteed by kind-prefixed naming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(Vec<(String, Value)>);

impl Bindings {
    /// Create an empty bindings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value under a generated alias.
    pub fn insert(&mut self, alias: String, value: Value) {
        self.0.push((alias, value));
    }

    /// Look up a bound value by alias.
    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, value)| value)
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no value is bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate (alias, value) pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(alias, value)| (alias.as_str(), value))
    }
}

/// The output of [`compile`]: WHERE body, bindings, ordering directive.
///
/// An empty `where_sql` with empty bindings means "match all rows"
/// downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledCondition {
    /// WHERE-clause body; each fragment keeps its leading AND/OR keyword.
    pub where_sql: String,
    /// Named parameters referenced by `where_sql`.
    pub bindings: Bindings,
    /// Ordering directive, passed through unconsumed by the compiler.
    pub order_by: Option<String>,
}

/// Compile accumulated predicates and by-example pairs into SQL.
///
/// By-example pairs behave like explicit `eq` predicates but never override
/// one: when both target the same column, the explicit chained predicate
/// wins. Emission order is fixed: conjunctive kinds in [`ComparisonKind`]
/// declaration order, the disjunctive group last.
pub fn compile(conditions: &ConditionSet, example: &[(String, Value)]) -> CompiledCondition {
    let mut groups = conditions.groups().clone();

    if !example.is_empty() {
        let eq_group = groups.entry(ComparisonKind::Eq).or_default();
        for (column, value) in example {
            eq_group
                .entry(column.clone())
                .or_insert_with(|| value.clone());
        }
    }

    let mut fragments: Vec<String> = Vec::new();
    let mut bindings = Bindings::new();
    for (kind, group) in &groups {
        for (column, value) in group {
            fragments.push(render(*kind, column, value, &mut bindings));
        }
    }

    let where_sql = fragments.join(" ");
    debug!(
        where_sql = %where_sql,
        bindings = bindings.len(),
        "compiled condition"
    );

    CompiledCondition {
        where_sql,
        bindings,
        order_by: conditions.ordering().map(str::to_string),
    }
}

/// Render one field-level fragment and register its bindings.
fn render(kind: ComparisonKind, column: &str, value: &Value, bindings: &mut Bindings) -> String {
    let keyword = if kind.is_disjunctive() { "OR" } else { "AND" };
    let operator = kind.operator();
    match kind {
        ComparisonKind::In | ComparisonKind::NotIn => {
            let elements = match value {
                Value::Array(elements) => elements.as_slice(),
                other => std::slice::from_ref(other),
            };
            if elements.is_empty() {
                // Degenerate empty list: deterministic match-none / match-all.
                let fragment = if kind == ComparisonKind::In { "1=0" } else { "1=1" };
                return format!("{keyword} {fragment}");
            }
            let placeholders: Vec<String> = elements
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    let alias = format!("{}_{column}_{index}", kind.alias_prefix());
                    bindings.insert(alias.clone(), element.clone());
                    format!(":{alias}")
                })
                .collect();
            format!(
                "{keyword} {column} {operator} ({})",
                placeholders.join(", ")
            )
        }
        ComparisonKind::Like => {
            let alias = format!("{}_{column}", kind.alias_prefix());
            bindings.insert(alias.clone(), value.clone());
            format!("{keyword} {column} {operator} CONCAT('%', :{alias}, '%')")
        }
        ComparisonKind::IsNull => format!("{keyword} {column} {operator}"),
        _ => {
            let alias = format!("{}_{column}", kind.alias_prefix());
            bindings.insert(alias.clone(), value.clone());
            format!("{keyword} {column} {operator} :{alias}")
        }
    }
}
