// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Transport seam.
//!
//! ```text
//! QueryBuilder ──RequestEnvelope──→ Executor ──→ engine
//!                                      │
//!                                      ├─→ HttpExecutor   (reqwest, pooled)
//!                                      └─→ MemoryExecutor (scripted, tests)
//! ```

pub mod traits;
pub mod http;
pub mod memory;

pub use traits::{Executor, QueryError, TransportError};
pub use http::{HttpExecutor, Route};
pub use memory::MemoryExecutor;
