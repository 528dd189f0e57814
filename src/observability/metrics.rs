//! Index lifecycle counters
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of index lifecycle counters.
///
/// One registry is usually shared by every creator of a process through an
/// `Arc`.
///
/// # Thread Safety
///
/// All counters use Relaxed atomic increments; readers see exact totals once
/// the recording calls have returned.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Successful builds
    builds: AtomicU64,
    /// Rejected or failed builds
    build_failures: AtomicU64,
    /// Rows indexed by successful builds, nulls included
    rows_indexed: AtomicU64,
    /// Serialize calls
    serializations: AtomicU64,
    /// Blob bytes produced by serialize
    bytes_serialized: AtomicU64,
    /// Successful loads
    loads: AtomicU64,
    /// Rejected loads
    load_rejections: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful build of `rows` rows
    pub fn record_build(&self, rows: u64) {
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.rows_indexed.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_build_failure(&self) {
        self.build_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a serialize call producing `bytes` blob bytes
    pub fn record_serialization(&self, bytes: u64) {
        self.serializations.fetch_add(1, Ordering::Relaxed);
        self.bytes_serialized.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_rejection(&self) {
        self.load_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            builds: self.builds.load(Ordering::Relaxed),
            build_failures: self.build_failures.load(Ordering::Relaxed),
            rows_indexed: self.rows_indexed.load(Ordering::Relaxed),
            serializations: self.serializations.load(Ordering::Relaxed),
            bytes_serialized: self.bytes_serialized.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_rejections: self.load_rejections.load(Ordering::Relaxed),
        }
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub builds: u64,
    pub build_failures: u64,
    pub rows_indexed: u64,
    pub serializations: u64,
    pub bytes_serialized: u64,
    pub loads: u64,
    pub load_rejections: u64,
}
