// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Request envelopes and the request-shaping types that feed them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordered sort keys. Order of insertion is the order sent to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    keys: Vec<(String, SortDirection)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.keys.push((field.into(), direction));
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `[{field: {order: "asc" | "desc"}}, ...]`
    pub fn render(&self) -> Value {
        Value::Array(
            self.keys
                .iter()
                .map(|(field, direction)| {
                    let mut key = Map::new();
                    key.insert(field.clone(), json!({ "order": direction.as_str() }));
                    Value::Object(key)
                })
                .collect(),
        )
    }
}

/// Which source fields the engine should return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSelection {
    /// Every field (no `_source` restriction)
    #[default]
    All,
    /// Only the listed fields, in order
    Fields(Vec<String>),
}

impl FieldSelection {
    /// Build a selection from field names; `*` anywhere selects everything.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() || fields.iter().any(|f| f == "*") {
            Self::All
        } else {
            Self::Fields(fields)
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Fields(_))
    }

    /// Value for `_source`, when restricted.
    pub fn render(&self) -> Option<Value> {
        match self {
            Self::All => None,
            Self::Fields(fields) => Some(json!(fields)),
        }
    }
}

/// The engine operation an envelope targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Search,
    Get,
    Bulk,
    Index,
    Update,
    Delete,
    PutMapping,
    PutSettings,
    CreateIndex,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Get => "get",
            Self::Bulk => "bulk",
            Self::Index => "index",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::PutMapping => "put_mapping",
            Self::PutSettings => "put_settings",
            Self::CreateIndex => "create_index",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnvelopeBody {
    /// No body (get, delete)
    Empty,
    /// A single JSON document
    Json(Value),
    /// Newline-delimited documents (bulk)
    Lines(Vec<Value>),
}

/// A fully assembled request for one operation.
///
/// Built fresh per call and handed to an
/// [`Executor`](crate::transport::Executor). Control metadata (`id`,
/// `routing`, `timestamp`) travels beside the body, never inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub collection: String,
    pub kind: OperationKind,
    pub metadata: BTreeMap<String, Value>,
    pub body: EnvelopeBody,
}

impl RequestEnvelope {
    pub fn new(collection: impl Into<String>, kind: OperationKind, body: EnvelopeBody) -> Self {
        Self {
            collection: collection.into(),
            kind,
            metadata: BTreeMap::new(),
            body,
        }
    }

    /// Attach a control-metadata entry (id, routing, timestamp).
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Document identity, rendered as text.
    pub fn id(&self) -> Option<String> {
        self.metadata_text("id")
    }

    /// A metadata entry rendered as text; strings render bare.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        self.metadata.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// The JSON body, when this is a single-document request.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            EnvelopeBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_render_preserves_order() {
        let mut sort = SortSpec::new();
        sort.push("price", SortDirection::Desc);
        sort.push("name", SortDirection::Asc);
        assert_eq!(
            sort.render(),
            json!([{"price": {"order": "desc"}}, {"name": {"order": "asc"}}])
        );
    }

    #[test]
    fn test_field_selection_wildcard_means_all() {
        assert_eq!(FieldSelection::from_fields(["*"]), FieldSelection::All);
        assert_eq!(FieldSelection::from_fields(["id", "*"]), FieldSelection::All);
        assert_eq!(FieldSelection::from_fields(Vec::<String>::new()), FieldSelection::All);
        assert!(FieldSelection::All.render().is_none());
    }

    #[test]
    fn test_field_selection_restricted() {
        let selection = FieldSelection::from_fields(["name", "price"]);
        assert!(selection.is_restricted());
        assert_eq!(selection.render(), Some(json!(["name", "price"])));
    }

    #[test]
    fn test_envelope_metadata() {
        let envelope = RequestEnvelope::new("products", OperationKind::Get, EnvelopeBody::Empty)
            .with_metadata("id", 42)
            .with_metadata("routing", "eu");
        assert_eq!(envelope.id().as_deref(), Some("42"));
        assert_eq!(envelope.metadata_text("routing").as_deref(), Some("eu"));
        assert!(envelope.json_body().is_none());
    }
}
