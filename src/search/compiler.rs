// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Condition Compiler
//!
//! Accumulates predicates and renders them into the engine's `bool` query.
//!
//! # Rendered Shape
//!
//! ```text
//! {
//!   "bool": {
//!     "must":     [ {match: ...}, {range: ...} ],
//!     "must_not": [ {terms: ...} ],
//!     "should":   [ {prefix: ...} ],
//!     "minimum_should_match": 1
//!   }
//! }
//! ```
//!
//! Empty groups are omitted. A compiler that never received a predicate
//! compiles to `None`; callers substitute [`match_all`].

use serde_json::{json, Map, Value};

use super::predicate::{ClauseGroup, Operator, Predicate};
use crate::transport::QueryError;

/// Render one predicate into its clause document and effective clause group.
///
/// `NotEquals` and `NotIn` are forced into `must_not` regardless of the
/// requested group.
pub fn render_clause(predicate: &Predicate, requested: ClauseGroup) -> (ClauseGroup, Value) {
    let field = predicate.field();
    let value = predicate.value().clone();

    match predicate.operator() {
        Operator::Equals => (requested, field_clause("match", field, value)),
        Operator::GreaterThan => (requested, range_clause(field, "gt", value)),
        Operator::LessThan => (requested, range_clause(field, "lt", value)),
        Operator::GreaterOrEqual => (requested, range_clause(field, "gte", value)),
        Operator::LessOrEqual => (requested, range_clause(field, "lte", value)),
        Operator::NotEquals => (ClauseGroup::MustNot, field_clause("match", field, value)),
        Operator::In => (requested, field_clause("terms", field, value)),
        Operator::NotIn => (ClauseGroup::MustNot, field_clause("terms", field, value)),
        Operator::Like => {
            let pattern = format!("*{}*", text_of(&value));
            (requested, field_clause("wildcard", field, Value::String(pattern)))
        }
        Operator::Regex => (requested, field_clause("regexp", field, value)),
        Operator::Prefix => (requested, field_clause("prefix", field, value)),
    }
}

/// `{kind: {field: value}}`
pub fn field_clause(kind: &str, field: &str, value: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(field.to_string(), value);
    let mut outer = Map::new();
    outer.insert(kind.to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn range_clause(field: &str, bound: &str, value: Value) -> Value {
    let mut bounds = Map::new();
    bounds.insert(bound.to_string(), value);
    field_clause("range", field, Value::Object(bounds))
}

/// Strings render bare; anything else renders as its JSON text.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The query used when no predicate was added.
pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

/// Predicate accumulator for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionCompiler {
    must: Vec<Value>,
    must_not: Vec<Value>,
    should: Vec<Value>,
    minimum_should_match: Option<u32>,
}

impl ConditionCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed predicate.
    pub fn add_predicate(&mut self, predicate: &Predicate, group: ClauseGroup) {
        let (group, clause) = render_clause(predicate, group);
        self.push(group, clause);
    }

    /// Add a predicate whose operator is given in textual form.
    ///
    /// Unknown operators are rejected before anything is recorded.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
        group: ClauseGroup,
    ) -> Result<(), QueryError> {
        let predicate = Predicate::parse(field, operator, value)?;
        self.add_predicate(&predicate, group);
        Ok(())
    }

    /// Add an already-rendered clause document (e.g. `match_phrase`).
    pub fn add_clause(&mut self, clause: Value, group: ClauseGroup) {
        self.push(group, clause);
    }

    fn push(&mut self, group: ClauseGroup, clause: Value) {
        match group {
            ClauseGroup::Must => self.must.push(clause),
            ClauseGroup::MustNot => self.must_not.push(clause),
            ClauseGroup::Should => {
                self.should.push(clause);
                self.minimum_should_match.get_or_insert(1);
            }
        }
    }

    /// Clauses accumulated in a group, in insertion order.
    pub fn clauses(&self, group: ClauseGroup) -> &[Value] {
        match group {
            ClauseGroup::Must => &self.must,
            ClauseGroup::MustNot => &self.must_not,
            ClauseGroup::Should => &self.should,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.should.is_empty()
    }

    /// Render the `bool` query, or `None` when nothing was added.
    ///
    /// Does not mutate; repeated calls yield identical documents.
    pub fn compile(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }

        let mut bool_query = Map::new();
        for group in [ClauseGroup::Must, ClauseGroup::MustNot, ClauseGroup::Should] {
            let clauses = self.clauses(group);
            if !clauses.is_empty() {
                bool_query.insert(group.key().to_string(), Value::Array(clauses.to_vec()));
            }
        }
        if let Some(min) = self.minimum_should_match {
            bool_query.insert("minimum_should_match".to_string(), json!(min));
        }

        Some(json!({ "bool": bool_query }))
    }

    /// [`compile`](Self::compile) with the `match_all` fallback applied.
    pub fn compile_or_match_all(&self) -> Value {
        self.compile().unwrap_or_else(match_all)
    }
}
