//! Index cursor state
//!
//! The cursor is plain data: a direction, the position (the next entry to
//! visit, or the last entry visited), an optional duplicate-chain key and an
//! optional stop bound. It holds no borrow of the index, so an executor can
//! keep it across suspended invocations, and the position can be serialized.
//!
//! The cursor is not `Clone`; one cursor belongs to one scan.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Value;

use super::key::IndexEntry;

/// Direction in which the cursor walks the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanDirection {
    #[default]
    Forward,
    Reverse,
}

/// Where the cursor is in the index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorPosition {
    /// Nothing left to visit
    #[default]
    Exhausted,
    /// Next visit returns this entry (if it still exists) or the first one past it
    At(IndexEntry),
    /// Next visit returns the first entry strictly past this one
    Past(IndexEntry),
}

/// Bound at which a directional scan stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopBound {
    pub key: Vec<Value>,
    pub inclusive: bool,
}

impl StopBound {
    /// Returns true if `entry` is still inside the bound when walking in `direction`
    pub fn admits(&self, entry: &IndexEntry, direction: ScanDirection) -> bool {
        let ord = entry.prefix_cmp(&self.key);
        match (direction, self.inclusive) {
            (ScanDirection::Forward, true) => ord != Ordering::Greater,
            (ScanDirection::Forward, false) => ord == Ordering::Less,
            (ScanDirection::Reverse, true) => ord != Ordering::Less,
            (ScanDirection::Reverse, false) => ord == Ordering::Greater,
        }
    }
}

/// Exclusively-owned iteration state over one index
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexCursor {
    direction: ScanDirection,
    position: CursorPosition,
    match_key: Option<Vec<Value>>,
    stop: Option<StopBound>,
}

impl IndexCursor {
    /// Creates an unpositioned (exhausted) cursor
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all state. Only done when a new logical scan begins.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Position on a duplicate chain. `first` is the first entry of the chain, if any.
    pub fn start_chain(&mut self, key: Vec<Value>, first: Option<IndexEntry>) {
        self.direction = ScanDirection::Forward;
        self.match_key = Some(key);
        self.stop = None;
        self.position = first.map_or(CursorPosition::Exhausted, CursorPosition::At);
    }

    /// Position for a directional walk starting at `first`
    pub fn start_walk(
        &mut self,
        direction: ScanDirection,
        first: Option<IndexEntry>,
        stop: Option<StopBound>,
    ) {
        self.direction = direction;
        self.match_key = None;
        self.stop = stop;
        self.position = first.map_or(CursorPosition::Exhausted, CursorPosition::At);
    }

    /// Record that `entry` was returned
    pub fn advance_past(&mut self, entry: IndexEntry) {
        self.position = CursorPosition::Past(entry);
    }

    /// Mark the cursor as having nothing more to return
    pub fn exhaust(&mut self) {
        self.position = CursorPosition::Exhausted;
    }

    pub fn direction(&self) -> ScanDirection {
        self.direction
    }

    pub fn position(&self) -> &CursorPosition {
        &self.position
    }

    /// Key of the duplicate chain being walked, if positioned on one
    pub fn match_key(&self) -> Option<&[Value]> {
        self.match_key.as_deref()
    }

    pub fn stop(&self) -> Option<&StopBound> {
        self.stop.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.position == CursorPosition::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowId;

    fn entry(k: i64, row: u64) -> IndexEntry {
        IndexEntry::new(vec![Value::Integer(k)], RowId(row))
    }

    #[test]
    fn test_new_cursor_is_exhausted() {
        assert!(IndexCursor::new().is_exhausted());
    }

    #[test]
    fn test_reset_clears_chain() {
        let mut cursor = IndexCursor::new();
        cursor.start_chain(vec![Value::Integer(1)], Some(entry(1, 0)));
        assert_eq!(cursor.match_key(), Some(&[Value::Integer(1)][..]));
        cursor.reset();
        assert_eq!(cursor.match_key(), None);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_stop_bound_directions() {
        let upper = StopBound {
            key: vec![Value::Integer(5)],
            inclusive: true,
        };
        assert!(upper.admits(&entry(5, 0), ScanDirection::Forward));
        assert!(!upper.admits(&entry(6, 0), ScanDirection::Forward));

        let lower = StopBound {
            key: vec![Value::Integer(5)],
            inclusive: false,
        };
        assert!(!lower.admits(&entry(5, 0), ScanDirection::Reverse));
        assert!(lower.admits(&entry(6, 0), ScanDirection::Reverse));
    }

    #[test]
    fn test_position_serializes() {
        let mut cursor = IndexCursor::new();
        cursor.start_walk(ScanDirection::Reverse, Some(entry(3, 2)), None);
        cursor.advance_past(entry(3, 2));
        let json = serde_json::to_string(cursor.position()).unwrap();
        let back: CursorPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, cursor.position());
    }
}
