// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Predicate AST
//!
//! A [`Predicate`] is one `field / operator / value` comparison. Predicates are
//! immutable once built; the [`ConditionCompiler`](super::ConditionCompiler)
//! turns them into clause documents.
//!
//! # Operators
//!
//! ```text
//! =        Equals          match
//! >  <     GreaterThan...  range { gt | lt }
//! >= <=    GreaterOrEqual  range { gte | lte }
//! != <>    NotEquals       match        (forced into must_not)
//! in       In              terms
//! not in   NotIn           terms        (forced into must_not)
//! like     Like            wildcard *value*
//! regex    Regex           regexp
//! prefix   Prefix          prefix
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::QueryError;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    Equals,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `!=` or `<>`
    NotEquals,
    /// `in`
    In,
    /// `not in`
    NotIn,
    /// `like` (substring)
    Like,
    /// `regex`
    Regex,
    /// `prefix`
    Prefix,
}

impl Operator {
    /// Every operator the compiler renders.
    pub const ALL: [Operator; 11] = [
        Operator::Equals,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::NotEquals,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::Regex,
        Operator::Prefix,
    ];

    /// Canonical textual form
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::NotEquals => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Like => "like",
            Self::Regex => "regex",
            Self::Prefix => "prefix",
        }
    }

    /// Membership operators take a sequence of values.
    pub fn is_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let op = match normalized.as_str() {
            "=" => Self::Equals,
            ">" => Self::GreaterThan,
            "<" => Self::LessThan,
            ">=" => Self::GreaterOrEqual,
            "<=" => Self::LessOrEqual,
            "!=" | "<>" => Self::NotEquals,
            "in" => Self::In,
            "not in" => Self::NotIn,
            "like" => Self::Like,
            "regex" => Self::Regex,
            "prefix" => Self::Prefix,
            _ => return Err(QueryError::UnsupportedOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// Boolean clause bucket a predicate lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClauseGroup {
    /// AND-required
    #[default]
    Must,
    /// AND-excluded
    MustNot,
    /// OR; at least one must match when non-empty
    Should,
}

impl ClauseGroup {
    /// Key used in the `bool` query document
    pub fn key(self) -> &'static str {
        match self {
            Self::Must => "must",
            Self::MustNot => "must_not",
            Self::Should => "should",
        }
    }
}

impl fmt::Display for ClauseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    field: String,
    operator: Operator,
    value: Value,
}

impl Predicate {
    /// Create a predicate.
    ///
    /// Membership operators always carry a sequence: a scalar value is wrapped
    /// into a one-element array so `terms` never receives a bare scalar.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        let value = value.into();
        let value = match value {
            Value::Array(_) => value,
            scalar if operator.is_membership() => Value::Array(vec![scalar]),
            other => other,
        };
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Parse the operator from its textual form.
    pub fn parse(
        field: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        Ok(Self::new(field, operator.parse()?, value))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}
