// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder
//!
//! Fluent surface over the [`ConditionCompiler`]. Mutators consume and return
//! the builder; operations borrow it, assemble a fresh [`RequestEnvelope`],
//! send it through the [`Executor`] and map the response.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use search_builder::{DocumentModel, QueryBuilder, HttpExecutor, ConnectionConfig};
//! # async fn example() -> Result<(), search_builder::QueryError> {
//! let executor = Arc::new(HttpExecutor::connect(&ConnectionConfig::default(), "default")?);
//! let page = QueryBuilder::new(DocumentModel::new("products"), executor)
//!     .filter("price", ">=", 100)
//!     .filter_eq("status", "active")
//!     .order_by("price", true)
//!     .page(20, 1)
//!     .await?;
//!
//! println!("{} of {} matches", page.len(), page.total());
//! # Ok(())
//! # }
//! ```
//!
//! # Reuse
//!
//! Operations do not reset accumulated state; running a second operation on
//! the same builder reuses every predicate added so far. Clone the builder
//! before adding predicates when two queries must stay independent.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::compiler::{field_clause, match_all, ConditionCompiler};
use super::envelope::{EnvelopeBody, FieldSelection, OperationKind, RequestEnvelope, SortDirection, SortSpec};
use super::mapper::ResultMapper;
use super::paginator::PageResult;
use super::predicate::{ClauseGroup, Operator, Predicate};
use crate::metrics::{self, LatencyTimer};
use crate::model::{normalize_casts, Attributes, FieldCast, Model};
use crate::transport::{Executor, QueryError};

/// Search size used by [`QueryBuilder::fetch_all`] when no limit was taken.
///
/// Documents beyond this cap are not returned.
pub const DEFAULT_FETCH_CAP: u64 = 9999;

/// Record fields that travel as request metadata instead of document body.
const CONTROL_FIELDS: [&str; 3] = ["id", "routing", "timestamp"];

/// Fluent query builder bound to one model and one executor.
#[derive(Clone)]
pub struct QueryBuilder<M: Model> {
    model: M,
    executor: Arc<dyn Executor>,
    conditions: ConditionCompiler,
    sort: SortSpec,
    selection: FieldSelection,
    highlight: Vec<String>,
    limit: Option<u64>,
    rejected: Option<QueryError>,
}

impl<M: Model> QueryBuilder<M> {
    pub fn new(model: M, executor: Arc<dyn Executor>) -> Self {
        Self {
            model,
            executor,
            conditions: ConditionCompiler::new(),
            sort: SortSpec::new(),
            selection: FieldSelection::All,
            highlight: Vec::new(),
            limit: None,
            rejected: None,
        }
    }

    /// The prototype model instances are stamped from.
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn collection(&self) -> &str {
        self.model.collection_name()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicates
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a `must` predicate with a textual operator.
    ///
    /// An unknown operator does not break the chain; it is reported by
    /// [`compile`](Self::compile) and by every query operation, before any
    /// request is sent.
    pub fn filter(self, field: impl Into<String>, operator: &str, value: impl Into<Value>) -> Self {
        self.parsed(field, operator, value, ClauseGroup::Must)
    }

    /// Add a `must` predicate with a typed operator.
    pub fn filter_op(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.conditions
            .add_predicate(&Predicate::new(field, operator, value), ClauseGroup::Must);
        self
    }

    /// `field = value`
    pub fn filter_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_op(field, Operator::Equals, value)
    }

    /// `field in (values...)`
    pub fn filter_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter_op(field, Operator::In, values)
    }

    /// `field not in (values...)`
    pub fn filter_not_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter_op(field, Operator::NotIn, values)
    }

    /// Substring match: `wildcard *value*`
    pub fn filter_like(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_op(field, Operator::Like, value)
    }

    /// Add a `should` predicate; at least one `should` clause must match.
    pub fn or_should(self, field: impl Into<String>, operator: &str, value: impl Into<Value>) -> Self {
        self.parsed(field, operator, value, ClauseGroup::Should)
    }

    /// `should` on `field = value`
    pub fn should_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .add_predicate(&Predicate::new(field, Operator::Equals, value), ClauseGroup::Should);
        self
    }

    /// Phrase match on an analyzed field.
    pub fn match_phrase(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .add_clause(field_clause("match_phrase", field, value.into()), ClauseGroup::Must);
        self
    }

    /// Full-text match on an analyzed field.
    pub fn match_text(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .add_clause(field_clause("match", field, value.into()), ClauseGroup::Must);
        self
    }

    fn parsed(
        mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
        group: ClauseGroup,
    ) -> Self {
        if let Err(e) = self.conditions.add(field, operator, value, group) {
            warn!(operator = %operator, collection = %self.collection(), "Rejected predicate operator");
            metrics::record_rejected_operator(operator);
            self.rejected.get_or_insert(e);
        }
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Shaping
    // ═══════════════════════════════════════════════════════════════════════

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        self.sort.push(field, direction);
        self
    }

    /// Restrict returned source fields. `*` selects everything.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = FieldSelection::from_fields(fields);
        self
    }

    /// Request highlighting on the given fields.
    pub fn highlight<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Limit [`fetch_all`](Self::fetch_all) to `n` documents.
    pub fn take(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// The compiled `bool` query, or `None` when no predicate was added.
    pub fn compile(&self) -> Result<Option<Value>, QueryError> {
        match &self.rejected {
            Some(e) => Err(e.clone()),
            None => Ok(self.conditions.compile()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Envelopes
    // ═══════════════════════════════════════════════════════════════════════

    /// Search envelope for page `page` (1-based) of `size` documents.
    pub fn page_envelope(&self, size: u64, page: u64) -> Result<RequestEnvelope, QueryError> {
        if size == 0 {
            return Err(QueryError::InvalidArgument("page size must be at least 1".into()));
        }
        if page == 0 {
            return Err(QueryError::InvalidArgument("page number must be at least 1".into()));
        }
        let from = (page - 1).saturating_mul(size);
        self.search_envelope(Some(from), size)
    }

    /// Search envelope used by [`fetch_all`](Self::fetch_all).
    pub fn fetch_envelope(&self) -> Result<RequestEnvelope, QueryError> {
        self.search_envelope(None, self.limit.unwrap_or(DEFAULT_FETCH_CAP))
    }

    fn search_envelope(&self, from: Option<u64>, size: u64) -> Result<RequestEnvelope, QueryError> {
        let query = self.compile()?.unwrap_or_else(match_all);

        let mut body = Map::new();
        if let Some(from) = from {
            body.insert("from".into(), json!(from));
        }
        body.insert("size".into(), json!(size));
        body.insert("query".into(), query);
        if !self.sort.is_empty() {
            body.insert("sort".into(), self.sort.render());
        }
        if let Some(source) = self.selection.render() {
            body.insert("_source".into(), source);
        }
        if !self.highlight.is_empty() {
            let fields: Map<String, Value> = self
                .highlight
                .iter()
                .map(|f| (f.clone(), json!({})))
                .collect();
            body.insert("highlight".into(), json!({ "fields": fields }));
        }

        Ok(RequestEnvelope::new(
            self.collection(),
            OperationKind::Search,
            EnvelopeBody::Json(Value::Object(body)),
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════

    /// Fetch one page. `total` is the engine's full match count.
    pub async fn page(&self, size: u64, page: u64) -> Result<PageResult<M>, QueryError> {
        let envelope = self.page_envelope(size, page)?;
        let response = self.run(envelope).await?;

        let total = ResultMapper::total(&response)?;
        let hits = ResultMapper::hits(&response);
        metrics::record_hits(hits.len());
        let items = ResultMapper::map_hits(&self.model, hits);

        debug!(collection = %self.collection(), page, size, total, "Page fetched");
        Ok(PageResult::wrap(items, size, page, total))
    }

    /// Fetch every match up to the taken limit or [`DEFAULT_FETCH_CAP`].
    pub async fn fetch_all(&self) -> Result<Vec<M>, QueryError> {
        let envelope = self.fetch_envelope()?;
        self.fetch(envelope).await
    }

    /// First match, or [`QueryError::NotFound`] when nothing matches.
    pub async fn first(&self) -> Result<M, QueryError> {
        let envelope = self.search_envelope(None, 1)?;
        self.fetch(envelope)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound {
                collection: self.collection().to_string(),
                id: "<first match>".into(),
            })
    }

    async fn fetch(&self, envelope: RequestEnvelope) -> Result<Vec<M>, QueryError> {
        let response = self.run(envelope).await?;
        let hits = ResultMapper::hits(&response);
        metrics::record_hits(hits.len());
        Ok(ResultMapper::map_hits(&self.model, hits))
    }

    /// Run aggregations over the current query.
    ///
    /// Returns the response's `aggregations` member unmapped (an empty object
    /// when the engine sent none).
    pub async fn group_by(&self, aggregations: Value) -> Result<Value, QueryError> {
        let query = self.compile()?.unwrap_or_else(match_all);
        let body = json!({
            "size": 0,
            "query": query,
            "aggs": aggregations,
        });
        let envelope = RequestEnvelope::new(self.collection(), OperationKind::Search, EnvelopeBody::Json(body));
        let response = self.run(envelope).await?;
        Ok(response
            .get("aggregations")
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    /// Fetch by identity, ignoring accumulated predicates.
    ///
    /// Anything but `found: true` is [`QueryError::NotFound`], including the
    /// error body of a 404 on a missing collection.
    pub async fn find(&self, id: &str) -> Result<M, QueryError> {
        let envelope = RequestEnvelope::new(self.collection(), OperationKind::Get, EnvelopeBody::Empty)
            .with_metadata("id", id);
        let response = self.run(envelope).await?;

        if response.get("found").and_then(Value::as_bool) != Some(true) {
            debug!(collection = %self.collection(), id, error = ?response.get("error"), "Document not found");
            return Err(QueryError::NotFound {
                collection: self.collection().to_string(),
                id: id.to_string(),
            });
        }
        Ok(ResultMapper::map_hit(&self.model, &response))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Writes
    // ═══════════════════════════════════════════════════════════════════════

    /// Index many records in one bulk call.
    ///
    /// Response items are paired with input records by position. Each model
    /// keeps its response item as the original snapshot. An empty input sends
    /// nothing.
    pub async fn insert(&self, records: Vec<Attributes>) -> Result<Vec<M>, QueryError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines = Vec::with_capacity(records.len() * 2);
        for record in &records {
            lines.push(json!({ "index": { "_index": self.collection() } }));
            lines.push(Value::Object(record.clone()));
        }
        metrics::record_bulk_items(records.len());

        let envelope = RequestEnvelope::new(self.collection(), OperationKind::Bulk, EnvelopeBody::Lines(lines));
        let response = self.run(envelope).await?;

        let items = response
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if items.len() != records.len() {
            warn!(
                collection = %self.collection(),
                expected = records.len(),
                received = items.len(),
                "Bulk response does not line up with input"
            );
            return Err(QueryError::BulkMismatch {
                expected: records.len(),
                received: items.len(),
            });
        }

        Ok(records
            .into_iter()
            .zip(items)
            .map(|(mut record, item)| {
                if let Some(id) = bulk_item_id(item) {
                    record.insert("_id".into(), id);
                }
                let mut model = self.model.new_instance();
                model.set_attributes(record);
                model.set_original(item.clone());
                model
            })
            .collect())
    }

    /// Index a single record.
    ///
    /// `id`, `routing` and `timestamp` are lifted out of the record into the
    /// request metadata. The returned model carries an original snapshot only
    /// when the engine answered `created`; otherwise it is unpersisted and its
    /// identity must not be trusted.
    pub async fn create(&self, record: Attributes) -> Result<M, QueryError> {
        let (body, control) = split_control_fields(record);

        let mut envelope = RequestEnvelope::new(
            self.collection(),
            OperationKind::Index,
            EnvelopeBody::Json(Value::Object(body.clone())),
        );
        for (key, value) in control {
            envelope = envelope.with_metadata(key, value);
        }

        let response = self.run(envelope).await?;
        let mut model = self.model.new_instance();
        if result_of(&response) == Some("created") {
            model.set_attributes(with_response_id(body, &response));
            model.set_original(response);
        } else {
            debug!(collection = %self.collection(), result = ?result_of(&response), "Document not created");
            model.set_attributes(body);
        }
        Ok(model)
    }

    /// Partial update by identity. Succeeds on `updated` or `noop`.
    pub async fn update(&self, record: Attributes, id: &str) -> Result<M, QueryError> {
        let envelope = RequestEnvelope::new(
            self.collection(),
            OperationKind::Update,
            EnvelopeBody::Json(json!({ "doc": record })),
        )
        .with_metadata("id", id);

        let response = self.run(envelope).await?;
        let mut model = self.model.new_instance();
        if matches!(result_of(&response), Some("updated") | Some("noop")) {
            model.set_attributes(with_response_id(record, &response));
            model.set_original(response);
        } else {
            debug!(collection = %self.collection(), id, result = ?result_of(&response), "Document not updated");
            model.set_attributes(record);
        }
        Ok(model)
    }

    /// True only when the engine answered `deleted`.
    pub async fn delete(&self, id: &str) -> Result<bool, QueryError> {
        let envelope = RequestEnvelope::new(self.collection(), OperationKind::Delete, EnvelopeBody::Empty)
            .with_metadata("id", id);
        let response = self.run(envelope).await?;
        Ok(result_of(&response) == Some("deleted"))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Administration
    // ═══════════════════════════════════════════════════════════════════════

    /// Add or update field mappings on the collection.
    pub async fn update_mapping(&self, fields: &BTreeMap<String, FieldCast>) -> Result<Value, QueryError> {
        let body = json!({ "properties": normalize_casts(fields) });
        info!(collection = %self.collection(), fields = fields.len(), "Updating mapping");
        let envelope = RequestEnvelope::new(self.collection(), OperationKind::PutMapping, EnvelopeBody::Json(body));
        self.run(envelope).await
    }

    /// Update collection settings.
    pub async fn update_setting(&self, settings: Value) -> Result<Value, QueryError> {
        let body = json!({ "settings": settings });
        info!(collection = %self.collection(), "Updating settings");
        let envelope = RequestEnvelope::new(self.collection(), OperationKind::PutSettings, EnvelopeBody::Json(body));
        self.run(envelope).await
    }

    /// Create the collection from the model's field casts.
    ///
    /// `mappings` overrides model casts on key collision. Empty `settings`
    /// are omitted from the body.
    pub async fn create_index(
        &self,
        mappings: &BTreeMap<String, FieldCast>,
        settings: Map<String, Value>,
    ) -> Result<Value, QueryError> {
        let mut properties = normalize_casts(&self.model.field_casts());
        properties.extend(normalize_casts(mappings));

        let mut body = Map::new();
        body.insert("mappings".into(), json!({ "properties": properties }));
        if !settings.is_empty() {
            body.insert("settings".into(), Value::Object(settings));
        }

        info!(collection = %self.collection(), "Creating index");
        let envelope = RequestEnvelope::new(
            self.collection(),
            OperationKind::CreateIndex,
            EnvelopeBody::Json(Value::Object(body)),
        );
        self.run(envelope).await
    }

    async fn run(&self, envelope: RequestEnvelope) -> Result<Value, QueryError> {
        let kind = envelope.kind.as_str();
        let _timer = LatencyTimer::new(kind);
        debug!(collection = %envelope.collection, kind = %envelope.kind, body = ?envelope.body, "Executing request");

        match self.executor.execute(&envelope).await {
            Ok(response) => {
                metrics::record_operation(kind, "success");
                Ok(response)
            }
            Err(e) => {
                metrics::record_operation(kind, "error");
                warn!(collection = %envelope.collection, kind = %envelope.kind, error = %e, "Request failed");
                Err(e.into())
            }
        }
    }
}

/// Split a record into (document body, control metadata).
fn split_control_fields(mut record: Attributes) -> (Attributes, Vec<(String, Value)>) {
    let control = CONTROL_FIELDS
        .iter()
        .filter_map(|key| record.remove(*key).map(|v| (key.to_string(), v)))
        .collect();
    (record, control)
}

fn result_of(response: &Value) -> Option<&str> {
    response.get("result").and_then(Value::as_str)
}

fn with_response_id(mut attributes: Attributes, response: &Value) -> Attributes {
    let id = response.get("_id").cloned().unwrap_or_else(|| json!(""));
    attributes.insert("_id".into(), id);
    attributes
}

/// `_id` of a bulk item: `{"index": {"_id": ..}}`
fn bulk_item_id(item: &Value) -> Option<Value> {
    item.as_object()?.values().next()?.get("_id").cloned()
}
