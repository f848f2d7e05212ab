//! Index cursor walking
//!
//! Positions the cursor once per logical scan and takes one candidate row
//! id per step. Equality-style lookups walk the duplicate chain of the
//! search key; every other lookup, and any lookup without active keys,
//! walks the index in the cursor's direction.

use std::ops::Bound;

use crate::index::{IndexCursor, KeyRange, ScanDirection, TableIndex};
use crate::planner::LookupType;
use crate::types::RowId;

use super::search_key::{ResolvedLookup, SearchKeyBuilder};

/// One "next row" step over an index cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCursorWalker {
    lookup: ResolvedLookup,
}

impl IndexCursorWalker {
    pub fn new(lookup: ResolvedLookup) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &ResolvedLookup {
        &self.lookup
    }

    /// Place the cursor at the first candidate of the scan
    pub fn position<I: TableIndex + ?Sized>(
        &self,
        index: &I,
        keys: &SearchKeyBuilder,
        direction: ScanDirection,
        cursor: &mut IndexCursor,
    ) {
        let lookup = &self.lookup;
        if lookup.active_keys == 0 {
            index.move_to_end(direction, cursor);
            return;
        }

        let key = keys.key();
        let values = key.values();
        let range = match lookup.lookup {
            LookupType::Equal => {
                index.move_to_key(&key, cursor);
                return;
            }
            LookupType::GeoContains => {
                index.move_to_covering_cell(&key, cursor);
                return;
            }
            LookupType::Greater => KeyRange {
                lower: Bound::Excluded(values),
                upper: Bound::Unbounded,
            },
            LookupType::GreaterEqual => KeyRange {
                lower: Bound::Included(values),
                upper: Bound::Unbounded,
            },
            LookupType::Less => KeyRange {
                lower: Bound::Unbounded,
                upper: Bound::Excluded(values),
            },
            LookupType::LessEqual => KeyRange {
                lower: Bound::Unbounded,
                upper: Bound::Included(values),
            },
            LookupType::Range => {
                let end = keys.end_key().values();
                KeyRange {
                    lower: if lookup.lower_inclusive {
                        Bound::Included(values)
                    } else {
                        Bound::Excluded(values)
                    },
                    upper: if lookup.upper_inclusive {
                        Bound::Included(end)
                    } else {
                        Bound::Excluded(end)
                    },
                }
            }
        };
        index.move_to_range(&range, direction, cursor);
    }

    /// Next candidate row id, or `None` once the scan is exhausted
    pub fn next<I: TableIndex + ?Sized>(&self, index: &I, cursor: &mut IndexCursor) -> Option<RowId> {
        let chained = self.lookup.lookup.is_equality_style();
        if chained {
            if let Some(row) = index.next_value_at_key(cursor) {
                return Some(row);
            }
        }
        // without active keys an equality lookup degrades to a full walk
        if !chained || self.lookup.active_keys == 0 {
            return index.next_value(cursor);
        }
        None
    }
}
