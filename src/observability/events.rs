//! Observable scan events
//!
//! Events are explicit and typed. Each maps to a stable name and a log level.

use std::fmt;

use tracing::Level;

/// Observable events in the scan executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Scan configuration loaded
    ConfigLoaded,

    // Scan lifecycle
    /// New logical scan started
    ScanStart,
    /// Suspended scan resumed
    ScanResume,
    /// Invocation yielded with rows remaining
    ScanSuspend,
    /// Logical scan ran out of rows
    ScanExhausted,
    /// Logical scan stopped at its limit
    ScanLimitReached,
    /// Scan state discarded by the caller
    ScanCancelled,
    /// Invocation failed; scan state discarded
    ScanFailed,

    // Anomalies
    /// Search key could not be coerced; the scan was adjusted or emptied
    SearchKeyOutOfRange,
    /// Index returned a row id the table does not hold
    IndexInconsistency,
}

impl Event {
    /// Returns the stable event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ScanStart => "SCAN_START",
            Event::ScanResume => "SCAN_RESUME",
            Event::ScanSuspend => "SCAN_SUSPEND",
            Event::ScanExhausted => "SCAN_EXHAUSTED",
            Event::ScanLimitReached => "SCAN_LIMIT_REACHED",
            Event::ScanCancelled => "SCAN_CANCELLED",
            Event::ScanFailed => "SCAN_FAILED",
            Event::SearchKeyOutOfRange => "SEARCH_KEY_OUT_OF_RANGE",
            Event::IndexInconsistency => "INDEX_INCONSISTENCY",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::ScanFailed => Level::ERROR,
            Event::IndexInconsistency => Level::WARN,
            Event::ConfigLoaded | Event::ScanCancelled => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Returns true if the event marks the end of a logical scan
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::ScanExhausted | Event::ScanLimitReached | Event::ScanCancelled | Event::ScanFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::ScanStart.as_str(), "SCAN_START");
        assert_eq!(Event::ScanSuspend.as_str(), "SCAN_SUSPEND");
        assert_eq!(Event::IndexInconsistency.as_str(), "INDEX_INCONSISTENCY");
    }

    #[test]
    fn test_event_levels() {
        assert_eq!(Event::IndexInconsistency.level(), Level::WARN);
        assert_eq!(Event::ScanFailed.level(), Level::ERROR);
        assert_eq!(Event::ScanResume.level(), Level::DEBUG);
    }

    #[test]
    fn test_terminal_events() {
        assert!(Event::ScanExhausted.is_terminal());
        assert!(!Event::ScanSuspend.is_terminal());
        assert!(!Event::ScanResume.is_terminal());
    }
}
