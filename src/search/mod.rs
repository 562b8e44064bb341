// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query construction and result shaping
//!
//! # Architecture
//!
//! ```text
//! QueryBuilder (fluent)
//!     ↓
//!     ├─→ ConditionCompiler → {"bool": {must, must_not, should}}
//!     ├─→ SortSpec / FieldSelection / pagination
//!     ↓
//! RequestEnvelope → Executor → raw response
//!     ↓
//! ResultMapper → models → PageResult
//! ```

mod predicate;
mod compiler;
mod envelope;
mod builder;
mod mapper;
mod paginator;

pub use predicate::{ClauseGroup, Operator, Predicate};
pub use compiler::{field_clause, match_all, render_clause, ConditionCompiler};
pub use envelope::{EnvelopeBody, FieldSelection, OperationKind, RequestEnvelope, SortDirection, SortSpec};
pub use builder::{QueryBuilder, DEFAULT_FETCH_CAP};
pub use mapper::ResultMapper;
pub use paginator::PageResult;
