// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::traits::{Executor, TransportError};
use crate::search::RequestEnvelope;

/// Executor that answers from a queue of scripted responses and journals
/// every envelope it receives. Used for tests and offline runs.
pub struct MemoryExecutor {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<RequestEnvelope>>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn push_response(&self, response: Value) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Every envelope received so far, in order.
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<RequestEnvelope> {
        self.requests.lock().last().cloned()
    }

    /// Scripted responses not yet consumed
    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }
}

impl Default for MemoryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for MemoryExecutor {
    async fn execute(&self, envelope: &RequestEnvelope) -> Result<Value, TransportError> {
        self.requests.lock().push(envelope.clone());
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection(format!(
                "no scripted response for {} on '{}'",
                envelope.kind, envelope.collection
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{EnvelopeBody, OperationKind};
    use serde_json::json;

    fn envelope() -> RequestEnvelope {
        RequestEnvelope::new("products", OperationKind::Delete, EnvelopeBody::Empty)
    }

    #[tokio::test]
    async fn test_responses_in_order() {
        let executor = MemoryExecutor::new();
        executor.push_response(json!({"n": 1}));
        executor.push_response(json!({"n": 2}));

        assert_eq!(executor.execute(&envelope()).await.unwrap(), json!({"n": 1}));
        assert_eq!(executor.execute(&envelope()).await.unwrap(), json!({"n": 2}));
        assert_eq!(executor.pending(), 0);
        assert_eq!(executor.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let executor = MemoryExecutor::new();
        executor.push_error(TransportError::Protocol("bad".into()));
        assert_eq!(
            executor.execute(&envelope()).await,
            Err(TransportError::Protocol("bad".into()))
        );
    }

    #[tokio::test]
    async fn test_unscripted_call_fails() {
        let executor = MemoryExecutor::new();
        let result = executor.execute(&envelope()).await;
        assert!(matches!(result, Err(TransportError::Connection(_))));
        assert_eq!(executor.last_request(), Some(envelope()));
    }
}
