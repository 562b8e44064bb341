//! Chaos Testing for Search Builder
//!
//! Failure scenarios at the executor seam:
//! 1. **FailingExecutor wrapper** - error injection at specific call counts
//! 2. **Scripted transport errors** - timeouts, refused connections, HTTP errors
//! 3. **Rejected predicates** - nothing may reach the wire
//!
//! # Running Chaos Tests
//! ```bash
//! cargo test --test chaos
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use search_builder::{
    DocumentModel, Executor, MemoryExecutor, QueryBuilder, QueryError, RequestEnvelope, TransportError,
};

// =============================================================================
// Failing Executor Wrapper - Precise Error Injection
// =============================================================================

/// Wraps an executor and fails on specific call numbers (1-indexed).
pub struct FailingExecutor<E: Executor> {
    inner: E,
    call_count: AtomicU64,
    fail_on_calls: Vec<u64>,
    error: TransportError,
}

impl<E: Executor> FailingExecutor<E> {
    pub fn new(inner: E, fail_on_calls: Vec<u64>, error: TransportError) -> Self {
        Self {
            inner,
            call_count: AtomicU64::new(0),
            fail_on_calls,
            error,
        }
    }

    pub fn calls(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Executor> Executor for FailingExecutor<E> {
    async fn execute(&self, envelope: &RequestEnvelope) -> Result<Value, TransportError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_calls.contains(&call) {
            return Err(self.error.clone());
        }
        self.inner.execute(envelope).await
    }
}

fn products() -> DocumentModel {
    DocumentModel::new("products")
}

fn empty_search() -> Value {
    json!({"hits": {"total": {"value": 0}, "hits": []}})
}

// =============================================================================
// Transport Failures
// =============================================================================

#[tokio::test]
async fn chaos_timeout_fails_whole_operation() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.push_error(TransportError::Timeout(Duration::from_secs(2)));

    let err = QueryBuilder::new(products(), executor.clone())
        .filter_eq("status", "active")
        .page(10, 1)
        .await
        .unwrap_err();

    assert_eq!(err, QueryError::Transport(TransportError::Timeout(Duration::from_secs(2))));
    assert_eq!(executor.requests().len(), 1);
}

#[tokio::test]
async fn chaos_http_error_surfaces_as_is() {
    let executor = Arc::new(MemoryExecutor::new());
    let rejected = TransportError::Status {
        status: 400,
        body: r#"{"error":{"type":"parsing_exception"}}"#.into(),
    };
    executor.push_error(rejected.clone());

    let err = QueryBuilder::new(products(), executor)
        .delete("p1")
        .await
        .unwrap_err();
    assert_eq!(err, QueryError::Transport(rejected));
}

#[tokio::test]
async fn chaos_failed_call_is_never_retried() {
    let inner = MemoryExecutor::new();
    inner.push_response(empty_search());
    let executor = Arc::new(FailingExecutor::new(
        inner,
        vec![1],
        TransportError::Connection("connection refused".into()),
    ));
    let builder = QueryBuilder::new(products(), executor.clone());

    let first = builder.fetch_all().await;
    assert!(matches!(first, Err(QueryError::Transport(TransportError::Connection(_)))));
    assert_eq!(executor.calls(), 1, "builder must not retry on its own");

    // The caller may retry; the next call goes through.
    let second = builder.fetch_all().await.unwrap();
    assert!(second.is_empty());
    assert_eq!(executor.calls(), 2);
}

#[tokio::test]
async fn chaos_bulk_failure_mid_sequence() {
    let inner = MemoryExecutor::new();
    inner.push_response(json!({"items": [{"index": {"_id": "1", "result": "created"}}]}));
    let executor = Arc::new(FailingExecutor::new(
        inner,
        vec![2],
        TransportError::Connection("pool exhausted".into()),
    ));
    let builder = QueryBuilder::new(products(), executor);

    let batch = |n: i64| vec![json!({"n": n}).as_object().cloned().unwrap()];
    assert_eq!(builder.insert(batch(1)).await.unwrap().len(), 1);
    assert!(matches!(
        builder.insert(batch(2)).await,
        Err(QueryError::Transport(TransportError::Connection(_)))
    ));
}

#[tokio::test]
async fn chaos_partial_bulk_success_is_returned_for_inspection() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.push_response(json!({"errors": true, "items": [
        {"index": {"_id": "1", "result": "created", "status": 201}},
        {"index": {"status": 400, "error": {"type": "mapper_parsing_exception"}}},
    ]}));

    let records = vec![
        json!({"price": 1}).as_object().cloned().unwrap(),
        json!({"price": "not a number"}).as_object().cloned().unwrap(),
    ];
    let models = QueryBuilder::new(products(), executor).insert(records).await.unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id(), Some("1"));
    assert_eq!(models[1].id(), None);
    assert_eq!(models[1].original().unwrap()["index"]["status"], json!(400));
}

// =============================================================================
// Rejected Predicates
// =============================================================================

#[tokio::test]
async fn chaos_unsupported_operator_sends_nothing() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.push_response(empty_search());

    let builder = QueryBuilder::new(products(), executor.clone())
        .filter_eq("status", "active")
        .filter("price", "~", 10)
        .or_should("name", "sounds like", "fone");

    assert_eq!(
        builder.page(10, 1).await.unwrap_err(),
        QueryError::UnsupportedOperator("~".into())
    );
    assert!(matches!(builder.fetch_all().await, Err(QueryError::UnsupportedOperator(_))));
    assert!(matches!(builder.first().await, Err(QueryError::UnsupportedOperator(_))));
    assert!(matches!(
        builder.group_by(json!({})).await,
        Err(QueryError::UnsupportedOperator(_))
    ));

    assert!(executor.requests().is_empty());
    assert_eq!(executor.pending(), 1);
}

#[tokio::test]
async fn chaos_invalid_page_arguments_send_nothing() {
    let executor = Arc::new(MemoryExecutor::new());
    let builder = QueryBuilder::new(products(), executor.clone());

    assert!(matches!(builder.page(0, 1).await, Err(QueryError::InvalidArgument(_))));
    assert!(matches!(builder.page(10, 0).await, Err(QueryError::InvalidArgument(_))));
    assert!(executor.requests().is_empty());
}

// =============================================================================
// Concurrent Callers
// =============================================================================

#[tokio::test]
async fn chaos_concurrent_builders_share_one_executor() {
    let executor = Arc::new(MemoryExecutor::new());
    for _ in 0..16 {
        executor.push_response(empty_search());
    }

    let mut handles = Vec::new();
    for i in 0..16 {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            QueryBuilder::new(products(), executor)
                .filter_eq("shard", i)
                .fetch_all()
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_empty());
    }
    assert_eq!(executor.requests().len(), 16);
}
