// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Model contract.
//!
//! The builder does not own attribute storage. It talks to the host's model
//! through [`Model`]: a prototype instance names the collection and field
//! casts, and fresh instances are stamped out per hit.
//!
//! [`DocumentModel`] is a schemaless implementation backed by a JSON map.
//!
//! # Example
//!
//! ```
//! use search_builder::{DocumentModel, FieldCast, Model};
//! use serde_json::json;
//!
//! let products = DocumentModel::new("products")
//!     .with_cast("name", "text")
//!     .with_cast("price", FieldCast::spec(json!({"type": "scaled_float", "scaling_factor": 100})));
//!
//! assert_eq!(products.collection_name(), "products");
//! assert_eq!(products.field_casts().len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded business fields of a document.
pub type Attributes = Map<String, Value>;

/// Field mapping: a bare type name or a full mapping spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldCast {
    Type(String),
    Spec(Map<String, Value>),
}

impl FieldCast {
    /// Wrap a structured spec. Non-object values are treated as empty specs.
    pub fn spec(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Spec(map),
            Value::String(name) => Self::Type(name),
            _ => Self::Spec(Map::new()),
        }
    }

    /// `Type("keyword")` → `{"type": "keyword"}`; specs pass through.
    pub fn normalize(&self) -> Value {
        match self {
            Self::Type(name) => {
                let mut spec = Map::new();
                spec.insert("type".to_string(), Value::String(name.clone()));
                Value::Object(spec)
            }
            Self::Spec(spec) => Value::Object(spec.clone()),
        }
    }
}

impl From<&str> for FieldCast {
    fn from(name: &str) -> Self {
        Self::Type(name.to_string())
    }
}

impl From<String> for FieldCast {
    fn from(name: String) -> Self {
        Self::Type(name)
    }
}

/// Normalize a set of field casts into a `properties` map.
pub fn normalize_casts<'a, I>(casts: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a String, &'a FieldCast)>,
{
    casts
        .into_iter()
        .map(|(field, cast)| (field.clone(), cast.normalize()))
        .collect()
}

/// What the builder needs from a host model.
pub trait Model: Send + Sync + Sized {
    /// Target collection (the engine's index).
    fn collection_name(&self) -> &str;

    /// Declared field casts, used when creating the collection.
    fn field_casts(&self) -> BTreeMap<String, FieldCast> {
        BTreeMap::new()
    }

    /// A blank instance of the same model.
    fn new_instance(&self) -> Self;

    fn set_attributes(&mut self, attributes: Attributes);

    /// Keep the raw engine document this instance was built from.
    fn set_original(&mut self, original: Value);
}

/// Schemaless model backed by a JSON map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentModel {
    collection: String,
    casts: BTreeMap<String, FieldCast>,
    attributes: Attributes,
    original: Option<Value>,
}

impl DocumentModel {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_cast(mut self, field: impl Into<String>, cast: impl Into<FieldCast>) -> Self {
        self.casts.insert(field.into(), cast.into());
        self
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// The raw engine document, once persisted or fetched.
    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    /// Identity from `_id` in the attributes, falling back to the original.
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("_id")
            .or_else(|| self.original.as_ref().and_then(|o| o.get("_id")))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// True once the engine has acknowledged this document.
    pub fn is_persisted(&self) -> bool {
        self.original.is_some()
    }
}

impl Model for DocumentModel {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn field_casts(&self) -> BTreeMap<String, FieldCast> {
        self.casts.clone()
    }

    fn new_instance(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            casts: self.casts.clone(),
            attributes: Attributes::new(),
            original: None,
        }
    }

    fn set_attributes(&mut self, attributes: Attributes) {
        self.attributes = attributes;
    }

    fn set_original(&mut self, original: Value) {
        self.original = Some(original);
    }
}

/// Serializes as its attributes.
impl Serialize for DocumentModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
