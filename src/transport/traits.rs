// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::search::RequestEnvelope;

/// Failure raised by an [`Executor`] while talking to the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Error returned by every builder operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unsupported operator '{0}'")]
    UnsupportedOperator(String),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("Bulk response carried {received} items for {expected} records")]
    BulkMismatch { expected: usize, received: usize },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// The single seam between the builder and the wire client.
///
/// An executor receives a fully assembled envelope (which names its target
/// collection and operation kind) and returns the engine's decoded JSON
/// response. Implementations never retry; a failed call is reported as-is.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, envelope: &RequestEnvelope) -> Result<Value, TransportError>;
}
