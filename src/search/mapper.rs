// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Result Mapper
//!
//! Turns raw engine hits into model instances. Each instance carries the
//! hit's `_source` as attributes and the full hit as its original snapshot.

use serde_json::Value;

use crate::model::{Attributes, Model};
use crate::transport::TransportError;

pub struct ResultMapper;

impl ResultMapper {
    /// Map every hit, preserving order.
    pub fn map_hits<M: Model>(prototype: &M, hits: &[Value]) -> Vec<M> {
        hits.iter().map(|hit| Self::map_hit(prototype, hit)).collect()
    }

    /// Map a single hit (or a get-by-id response, which has the same shape).
    pub fn map_hit<M: Model>(prototype: &M, hit: &Value) -> M {
        let mut model = prototype.new_instance();
        model.set_attributes(Self::source_of(hit));
        model.set_original(hit.clone());
        model
    }

    /// The `_source` map; absent or non-object yields an empty map.
    pub fn source_of(hit: &Value) -> Attributes {
        hit.get("_source")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// `hits.hits` of a search response; absent yields an empty slice.
    pub fn hits(response: &Value) -> &[Value] {
        response
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True match count from `hits.total`.
    ///
    /// Accepts both `{"value": n}` and a bare number.
    pub fn total(response: &Value) -> Result<u64, TransportError> {
        let total = response.get("hits").and_then(|h| h.get("total"));
        match total {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::Object(obj)) => obj.get("value").and_then(Value::as_u64),
            _ => None,
        }
        .ok_or_else(|| TransportError::Protocol("search response has no hits.total".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentModel;
    use serde_json::json;

    #[test]
    fn test_map_hit_keeps_source_and_original() {
        let proto = DocumentModel::new("products");
        let hit = json!({"_id": "1", "_score": 1.5, "_source": {"name": "phone"}});

        let model = ResultMapper::map_hit(&proto, &hit);
        assert_eq!(model.get("name"), Some(&json!("phone")));
        assert_eq!(model.original(), Some(&hit));
        assert_eq!(model.id(), Some("1"));
    }

    #[test]
    fn test_missing_source_is_empty() {
        let proto = DocumentModel::new("products");
        let model = ResultMapper::map_hit(&proto, &json!({"_id": "1"}));
        assert!(model.attributes().is_empty());
        assert!(model.is_persisted());
    }

    #[test]
    fn test_map_hits_preserves_order() {
        let proto = DocumentModel::new("products");
        let response = json!({"hits": {"total": {"value": 2}, "hits": [
            {"_id": "b", "_source": {"n": 2}},
            {"_id": "a", "_source": {"n": 1}},
        ]}});

        let models = ResultMapper::map_hits(&proto, ResultMapper::hits(&response));
        let ids: Vec<_> = models.iter().filter_map(|m| m.id()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_hits_absent() {
        assert!(ResultMapper::hits(&json!({})).is_empty());
    }

    #[test]
    fn test_total_formats() {
        assert_eq!(ResultMapper::total(&json!({"hits": {"total": {"value": 7}}})).unwrap(), 7);
        assert_eq!(ResultMapper::total(&json!({"hits": {"total": 3}})).unwrap(), 3);
        assert!(matches!(
            ResultMapper::total(&json!({"hits": {}})),
            Err(TransportError::Protocol(_))
        ));
    }
}
