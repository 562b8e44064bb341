// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for search-builder.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for installing an exporter.
//!
//! # Metric Naming Convention
//! - `search_builder_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `kind`: search, get, bulk, index, update, delete, put_mapping, ...
//! - `status`: success, error

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record an executed operation
pub fn record_operation(kind: &str, status: &str) {
    counter!(
        "search_builder_operations_total",
        "kind" => kind.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency
pub fn record_latency(kind: &str, duration: Duration) {
    histogram!(
        "search_builder_operation_seconds",
        "kind" => kind.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record the number of hits mapped from a search
pub fn record_hits(count: usize) {
    histogram!("search_builder_hits_returned").record(count as f64);
}

/// Record bulk request size
pub fn record_bulk_items(count: usize) {
    histogram!("search_builder_bulk_items").record(count as f64);
}

/// Record a predicate rejected before any request was sent
pub fn record_rejected_operator(operator: &str) {
    counter!(
        "search_builder_rejected_operators_total",
        "operator" => operator.to_string()
    )
    .increment(1);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    kind: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.kind, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the API doesn't panic without an installed recorder.

    #[test]
    fn test_record_operation() {
        record_operation("search", "success");
        record_operation("bulk", "error");
    }

    #[test]
    fn test_record_sizes() {
        record_hits(42);
        record_hits(0);
        record_bulk_items(3);
        record_rejected_operator("between");
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("search");
            std::thread::sleep(Duration::from_micros(10));
        }
        record_latency("get", Duration::from_millis(2));
    }
}
