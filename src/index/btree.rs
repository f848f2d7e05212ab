//! BTreeSet-based ordered index
//!
//! Entries are `(key, row id)` pairs in a `BTreeSet`, so iteration order is
//! deterministic and duplicates of one key are chained in row-id order.
//! Search keys may be prefixes of the index key.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;

use crate::table::Table;
use crate::types::{ColumnType, Row, RowId, Value};

use super::cursor::{IndexCursor, ScanDirection, StopBound};
use super::errors::{IndexError, IndexResult};
use super::key::{IndexEntry, SearchKey};
use super::{KeyRange, TableIndex};

/// Ordered in-memory index over one or more table columns
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    name: String,
    key_columns: Vec<usize>,
    key_types: Vec<ColumnType>,
    entries: BTreeSet<IndexEntry>,
}

impl BTreeIndex {
    /// Creates an empty index.
    ///
    /// `key_columns[i]` is the table column stored in key slot `i`, typed `key_types[i]`.
    pub fn new(
        name: impl Into<String>,
        key_columns: Vec<usize>,
        key_types: Vec<ColumnType>,
    ) -> IndexResult<Self> {
        let name = name.into();
        if key_columns.is_empty() {
            return Err(IndexError::build_failed(name, "index has no key columns"));
        }
        if key_columns.len() != key_types.len() {
            return Err(IndexError::build_failed(
                name,
                format!(
                    "{} key columns but {} key types",
                    key_columns.len(),
                    key_types.len()
                ),
            ));
        }
        Ok(Self {
            name,
            key_columns,
            key_types,
            entries: BTreeSet::new(),
        })
    }

    /// Build an index over `key_columns` of `table`, populated from its rows
    pub fn build(
        name: impl Into<String>,
        key_columns: Vec<usize>,
        table: &Table,
    ) -> IndexResult<Self> {
        let name = name.into();
        let key_types = key_columns
            .iter()
            .map(|&c| {
                table.columns().get(c).map(|def| def.column_type).ok_or_else(|| {
                    IndexError::build_failed(
                        name.clone(),
                        format!("column {} not in table '{}'", c, table.name()),
                    )
                })
            })
            .collect::<IndexResult<Vec<_>>>()?;

        let mut index = Self::new(name, key_columns, key_types)?;
        for (id, row) in table.iter() {
            index.insert(row, id)?;
        }
        Ok(index)
    }

    /// Insert the entry for `row`
    pub fn insert(&mut self, row: &Row, id: RowId) -> IndexResult<()> {
        let key = self.extract_key(row)?;
        self.entries.insert(IndexEntry::new(key, id));
        Ok(())
    }

    /// Remove the entry for `row`. Returns true if it was present.
    pub fn remove(&mut self, row: &Row, id: RowId) -> IndexResult<bool> {
        let key = self.extract_key(row)?;
        Ok(self.entries.remove(&IndexEntry::new(key, id)))
    }

    pub fn key_columns(&self) -> &[usize] {
        &self.key_columns
    }

    /// Total number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&Vec<Value>> = None;
        for entry in &self.entries {
            if last != Some(&entry.key) {
                count += 1;
                last = Some(&entry.key);
            }
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn extract_key(&self, row: &Row) -> IndexResult<Vec<Value>> {
        self.key_columns
            .iter()
            .zip(&self.key_types)
            .map(|(&column, column_type)| {
                let value = row.get(column).cloned().ok_or_else(|| {
                    IndexError::key_invalid(
                        self.name.clone(),
                        format!("row of width {} has no column {}", row.len(), column),
                    )
                })?;
                column_type
                    .coerce(value)
                    .map_err(|e| IndexError::key_invalid(self.name.clone(), e.to_string()))
            })
            .collect()
    }

    /// First entry whose prefix is >= `prefix`
    fn first_at_or_above(&self, prefix: &[Value]) -> Option<&IndexEntry> {
        self.entries.range(IndexEntry::floor(prefix)..).next()
    }

    /// First entry whose prefix is > `prefix`
    fn first_above(&self, prefix: &[Value]) -> Option<&IndexEntry> {
        self.entries
            .range(IndexEntry::floor(prefix)..)
            .find(|e| e.prefix_cmp(prefix) == Ordering::Greater)
    }

    /// Last entry whose prefix is < `prefix`
    fn last_below(&self, prefix: &[Value]) -> Option<&IndexEntry> {
        self.entries.range(..IndexEntry::floor(prefix)).next_back()
    }

    /// Last entry whose prefix is <= `prefix`
    fn last_at_or_below(&self, prefix: &[Value]) -> Option<&IndexEntry> {
        match self.first_above(prefix) {
            Some(above) => self
                .entries
                .range((Bound::Unbounded, Bound::Excluded(above)))
                .next_back(),
            None => self.entries.iter().next_back(),
        }
    }

    /// Entry the cursor would visit next, ignoring chain and stop bounds
    fn candidate(&self, cursor: &IndexCursor) -> Option<&IndexEntry> {
        use super::cursor::CursorPosition::*;

        match (cursor.position(), cursor.direction()) {
            (Exhausted, _) => None,
            (At(e), ScanDirection::Forward) => self
                .entries
                .range((Bound::Included(e), Bound::Unbounded))
                .next(),
            (Past(e), ScanDirection::Forward) => self
                .entries
                .range((Bound::Excluded(e), Bound::Unbounded))
                .next(),
            (At(e), ScanDirection::Reverse) => self
                .entries
                .range((Bound::Unbounded, Bound::Included(e)))
                .next_back(),
            (Past(e), ScanDirection::Reverse) => self
                .entries
                .range((Bound::Unbounded, Bound::Excluded(e)))
                .next_back(),
        }
    }
}

fn stop_for(bound: Bound<&[Value]>) -> Option<StopBound> {
    match bound {
        Bound::Included(key) => Some(StopBound {
            key: key.to_vec(),
            inclusive: true,
        }),
        Bound::Excluded(key) => Some(StopBound {
            key: key.to_vec(),
            inclusive: false,
        }),
        Bound::Unbounded => None,
    }
}

impl TableIndex for BTreeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn key_types(&self) -> &[ColumnType] {
        &self.key_types
    }

    fn move_to_key(&self, key: &SearchKey<'_>, cursor: &mut IndexCursor) -> bool {
        let prefix = key.values();
        let first = self
            .first_at_or_above(prefix)
            .filter(|e| e.prefix_cmp(prefix) == Ordering::Equal)
            .cloned();
        let found = first.is_some();
        cursor.start_chain(prefix.to_vec(), first);
        found
    }

    /// Cells are stored as ordinary keys here, so covering-cell lookup is a
    /// key lookup on the cell id.
    fn move_to_covering_cell(&self, key: &SearchKey<'_>, cursor: &mut IndexCursor) -> bool {
        self.move_to_key(key, cursor)
    }

    fn move_to_range(
        &self,
        range: &KeyRange<'_>,
        direction: ScanDirection,
        cursor: &mut IndexCursor,
    ) {
        let (first, stop) = match direction {
            ScanDirection::Forward => {
                let first = match range.lower {
                    Bound::Included(k) => self.first_at_or_above(k),
                    Bound::Excluded(k) => self.first_above(k),
                    Bound::Unbounded => self.entries.iter().next(),
                };
                (first, stop_for(range.upper))
            }
            ScanDirection::Reverse => {
                let first = match range.upper {
                    Bound::Included(k) => self.last_at_or_below(k),
                    Bound::Excluded(k) => self.last_below(k),
                    Bound::Unbounded => self.entries.iter().next_back(),
                };
                (first, stop_for(range.lower))
            }
        };
        cursor.start_walk(direction, first.cloned(), stop);
    }

    fn next_value_at_key(&self, cursor: &mut IndexCursor) -> Option<RowId> {
        let next = {
            let key = cursor.match_key()?;
            self.candidate(cursor)
                .filter(|e| e.prefix_cmp(key) == Ordering::Equal)
                .cloned()
        };
        match next {
            Some(entry) => {
                let row = entry.row;
                cursor.advance_past(entry);
                Some(row)
            }
            None => {
                cursor.exhaust();
                None
            }
        }
    }

    fn next_value(&self, cursor: &mut IndexCursor) -> Option<RowId> {
        let next = self.candidate(cursor).cloned().filter(|entry| {
            cursor
                .stop()
                .map_or(true, |stop| stop.admits(entry, cursor.direction()))
        });
        match next {
            Some(entry) => {
                let row = entry.row;
                cursor.advance_past(entry);
                Some(row)
            }
            None => {
                cursor.exhaust();
                None
            }
        }
    }
}
