//! Index access for the scan executor
//!
//! The executor drives an index only through the `TableIndex` primitives:
//! positioning a cursor at or around a key, advancing along a duplicate
//! chain, and advancing in the cursor's direction. `BTreeIndex` is the
//! ordered in-memory implementation.
//!
//! # Invariants
//!
//! - Index iteration order is deterministic: key order, then row-id order
//! - The index is never mutated by a scan
//! - Exhausting a cursor is sticky until it is repositioned

mod btree;
mod cursor;
mod errors;
mod key;

use std::ops::Bound;

pub use btree::BTreeIndex;
pub use cursor::{CursorPosition, IndexCursor, ScanDirection, StopBound};
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use key::{IndexEntry, SearchKey};

use crate::types::{ColumnType, RowId, Value};

/// Prefix bounds of a directional index walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange<'k> {
    pub lower: Bound<&'k [Value]>,
    pub upper: Bound<&'k [Value]>,
}

impl<'k> KeyRange<'k> {
    /// The whole index
    pub fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }
}

/// Cursor primitives an index exposes to the scan executor
pub trait TableIndex {
    /// Index name
    fn name(&self) -> &str;

    /// Types of the key columns, in key order
    fn key_types(&self) -> &[ColumnType];

    /// Position on the duplicate chain for `key`.
    ///
    /// Returns true if at least one entry matches.
    fn move_to_key(&self, key: &SearchKey<'_>, cursor: &mut IndexCursor) -> bool;

    /// Position on the entries whose cell covers `key` (geospatial indexes).
    fn move_to_covering_cell(&self, key: &SearchKey<'_>, cursor: &mut IndexCursor) -> bool;

    /// Position for a directional walk over `range`
    fn move_to_range(
        &self,
        range: &KeyRange<'_>,
        direction: ScanDirection,
        cursor: &mut IndexCursor,
    );

    /// Position at the start (forward) or end (reverse) for a full walk
    fn move_to_end(&self, direction: ScanDirection, cursor: &mut IndexCursor) {
        self.move_to_range(&KeyRange::full(), direction, cursor);
    }

    /// Next row on the current duplicate chain
    fn next_value_at_key(&self, cursor: &mut IndexCursor) -> Option<RowId>;

    /// Next row in the cursor's direction
    fn next_value(&self, cursor: &mut IndexCursor) -> Option<RowId>;
}
