//! Result types for scan invocations

use serde::Serialize;

use crate::types::Row;

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// The cursor has no more matching rows
    Exhausted,
    /// The inline limit was reached
    LimitReached,
    /// The invocation yielded; call again to continue
    Suspended,
}

impl ScanStatus {
    /// Returns true if the logical scan is over
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanStatus::Suspended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Exhausted => "exhausted",
            ScanStatus::LimitReached => "limit-reached",
            ScanStatus::Suspended => "suspended-more-available",
        }
    }
}

/// Counters for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvocationStats {
    /// Candidate rows taken from the cursor
    pub rows_scanned: u64,
    /// Rows that reached the output or the aggregator
    pub rows_emitted: u64,
    /// Rows dropped by the offset
    pub rows_skipped_by_offset: u64,
}

/// Output of one call to execute
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    /// Output rows in scan order, or the aggregated rows on the terminal
    /// invocation of an aggregating scan
    pub rows: Vec<Row>,
    pub status: ScanStatus,
    pub stats: InvocationStats,
}

impl InvocationResult {
    /// Returns true if calling execute again continues this scan
    pub fn has_more(&self) -> bool {
        self.status == ScanStatus::Suspended
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a JSON object for line-oriented output
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| serde_json::Value::Array(row.values().iter().map(|v| v.to_json()).collect()))
            .collect();
        serde_json::json!({
            "status": self.status.as_str(),
            "rows": rows,
            "stats": self.stats,
        })
    }
}
