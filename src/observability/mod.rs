//! Observability for the scan executor
//!
//! This module provides:
//! - Typed lifecycle events emitted through `tracing`
//! - Monotonic scan counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use aeroscan::observability::{log_event_with_fields, Event, EventFields, ScanMetrics};
//!
//! log_event_with_fields(Event::ScanStart, &EventFields::for_index("idx_a"));
//!
//! let metrics = ScanMetrics::new();
//! metrics.increment_scans_started();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{ScanMetrics, ScanMetricsSnapshot};

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Structured fields attached to an event.
///
/// Each populated field becomes a `tracing` field of the same name; unset
/// fields are left off the record.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventFields<'a> {
    pub index: Option<&'a str>,
    pub lookup: Option<&'a str>,
    pub direction: Option<&'a str>,
    pub rows_scanned: Option<u64>,
    pub row: Option<u64>,
    pub slot: Option<u64>,
    pub reason: Option<&'a str>,
    pub action: Option<&'a str>,
    pub error: Option<&'a str>,
    pub suspend_threshold: Option<i64>,
}

impl<'a> EventFields<'a> {
    pub fn for_index(index: &'a str) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }
}

macro_rules! emit {
    ($level:ident, $name:expr, $f:expr) => {
        tracing::$level!(
            event = $name,
            index = $f.index,
            lookup = $f.lookup,
            direction = $f.direction,
            rows_scanned = $f.rows_scanned,
            row = $f.row,
            slot = $f.slot,
            reason = $f.reason,
            action = $f.action,
            error = $f.error,
            suspend_threshold = $f.suspend_threshold,
        )
    };
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &EventFields::default());
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &EventFields<'_>) {
    let name = event.as_str();
    match event.level() {
        l if l == Level::ERROR => emit!(error, name, fields),
        l if l == Level::WARN => emit!(warn, name, fields),
        l if l == Level::INFO => emit!(info, name, fields),
        _ => emit!(debug, name, fields),
    }
}

/// Install a stderr `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_level`. A second call is a no-op.
pub fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
