//! Metrics registry
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Query path counters
///
/// Relaxed ordering throughout: counters are independent and read only for
/// reporting.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_total: AtomicU64,
    queries_succeeded: AtomicU64,
    queries_failed: AtomicU64,
    /// Failures raised by the provider (subset of failed)
    provider_faults: AtomicU64,
    /// 429 responses (subset of provider faults)
    throttled: AtomicU64,
    items_returned: AtomicU64,
    /// Request units consumed, in thousandths
    request_units_milli: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page returned by the provider
    pub fn record_success(&self, items: usize, request_units: f64) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.queries_succeeded.fetch_add(1, Ordering::Relaxed);
        self.items_returned.fetch_add(items as u64, Ordering::Relaxed);
        self.add_request_units(request_units);
    }

    /// Record a query the provider rejected
    pub fn record_provider_fault(&self, status_code: u16, request_units: f64) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
        self.provider_faults.fetch_add(1, Ordering::Relaxed);
        if status_code == 429 {
            self.throttled.fetch_add(1, Ordering::Relaxed);
        }
        self.add_request_units(request_units);
    }

    /// Record a query that failed without a provider verdict
    pub fn record_failure(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn add_request_units(&self, ru: f64) {
        if ru.is_finite() && ru > 0.0 {
            let milli = (ru * 1000.0).round() as u64;
            self.request_units_milli.fetch_add(milli, Ordering::Relaxed);
        }
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_total: self.queries_total.load(Ordering::Relaxed),
            queries_succeeded: self.queries_succeeded.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            provider_faults: self.provider_faults.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            items_returned: self.items_returned.load(Ordering::Relaxed),
            request_units_milli: self.request_units_milli.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub queries_succeeded: u64,
    pub queries_failed: u64,
    pub provider_faults: u64,
    pub throttled: u64,
    pub items_returned: u64,
    pub request_units_milli: u64,
}
