// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Search Builder
//!
//! A fluent query builder and result mapper for Elasticsearch-compatible
//! search engines.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QueryBuilder                         │
//! │  • filter / filter_in / filter_like / or_should / ...       │
//! │  • order_by, select, highlight, take                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ConditionCompiler                       │
//! │  • predicates → bool { must, must_not, should }             │
//! │  • match_all fallback when empty                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                    (RequestEnvelope per call)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Executor                            │
//! │  • HttpExecutor: pooled reqwest client, host rotation       │
//! │  • MemoryExecutor: scripted responses for tests             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                ResultMapper → PageResult                    │
//! │  • hits → models (source + original snapshot)               │
//! │  • total / page / size metadata                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use search_builder::{ConnectionConfig, DocumentModel, HttpExecutor, QueryBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), search_builder::QueryError> {
//!     let executor = Arc::new(HttpExecutor::connect(&ConnectionConfig::default(), "default")?);
//!     let products = DocumentModel::new("products");
//!
//!     let page = QueryBuilder::new(products, executor)
//!         .filter("price", ">=", 100)
//!         .filter_like("name", "phone")
//!         .order_by("price", true)
//!         .page(20, 1)
//!         .await?;
//!
//!     for product in page.items() {
//!         println!("{:?}", product.attributes());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`search`]: predicates, compiler, builder, mapper, paginator
//! - [`transport`]: the [`Executor`] seam and its implementations
//! - [`model`]: the model contract consumed from the host
//! - [`config`]: named connection profiles
//! - [`metrics`]: operation counters and latency histograms

pub mod config;
pub mod model;
pub mod search;
pub mod transport;
pub mod metrics;

pub use config::{ConnectionConfig, ConnectionProfile};
pub use model::{Attributes, DocumentModel, FieldCast, Model};
pub use search::{
    ClauseGroup, ConditionCompiler, FieldSelection, OperationKind, Operator, PageResult, Predicate,
    QueryBuilder, RequestEnvelope, ResultMapper, SortDirection, SortSpec,
};
pub use transport::{Executor, HttpExecutor, MemoryExecutor, QueryError, TransportError};
