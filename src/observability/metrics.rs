//! Scan metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Shared between executors through an `Arc`

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of scan counters.
///
/// Uses Relaxed ordering; counters are independent and only read for reporting.
#[derive(Debug, Default)]
pub struct ScanMetrics {
    /// Logical scans started
    scans_started: AtomicU64,
    /// Logical scans that reached a terminal status
    scans_completed: AtomicU64,
    /// Calls to execute, including resumes
    invocations: AtomicU64,
    /// Invocations that ended suspended
    suspensions: AtomicU64,
    /// Candidate rows taken from the index
    rows_scanned: AtomicU64,
    /// Rows passed to the output or the aggregator
    rows_emitted: AtomicU64,
    /// Rows dropped by the offset
    rows_skipped_by_offset: AtomicU64,
    /// Row ids the table could not resolve
    index_inconsistencies: AtomicU64,
    /// Invocations that returned an error
    failures: AtomicU64,
    /// Scans discarded by cancel
    cancellations: AtomicU64,
}

impl ScanMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_scans_started(&self) {
        self.scans_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_scans_completed(&self) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_suspensions(&self) {
        self.suspensions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_scanned(&self, rows: u64) {
        self.rows_scanned.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn add_rows_emitted(&self, rows: u64) {
        self.rows_emitted.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn add_rows_skipped_by_offset(&self, rows: u64) {
        self.rows_skipped_by_offset.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_index_inconsistencies(&self) {
        self.index_inconsistencies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancellations(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> ScanMetricsSnapshot {
        ScanMetricsSnapshot {
            scans_started: self.scans_started.load(Ordering::Relaxed),
            scans_completed: self.scans_completed.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            suspensions: self.suspensions.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            rows_emitted: self.rows_emitted.load(Ordering::Relaxed),
            rows_skipped_by_offset: self.rows_skipped_by_offset.load(Ordering::Relaxed),
            index_inconsistencies: self.index_inconsistencies.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanMetricsSnapshot {
    pub scans_started: u64,
    pub scans_completed: u64,
    pub invocations: u64,
    pub suspensions: u64,
    pub rows_scanned: u64,
    pub rows_emitted: u64,
    pub rows_skipped_by_offset: u64,
    pub index_inconsistencies: u64,
    pub failures: u64,
    pub cancellations: u64,
}

impl ScanMetricsSnapshot {
    /// Serialize to a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = ScanMetrics::new();
        assert_eq!(metrics.snapshot(), ScanMetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = ScanMetrics::new();
        metrics.increment_scans_started();
        metrics.add_rows_scanned(5);
        metrics.add_rows_scanned(3);
        metrics.increment_suspensions();

        let snap = metrics.snapshot();
        assert_eq!(snap.scans_started, 1);
        assert_eq!(snap.rows_scanned, 8);
        assert_eq!(snap.suspensions, 1);
        assert_eq!(snap.failures, 0);
    }

    #[test]
    fn test_snapshot_json() {
        let metrics = ScanMetrics::new();
        metrics.increment_index_inconsistencies();
        let json = metrics.snapshot().to_json();
        assert_eq!(json["index_inconsistencies"], 1);
        assert_eq!(json["rows_emitted"], 0);
    }
}
