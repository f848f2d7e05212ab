//! In-memory table storage
//!
//! Physical storage is owned by the engine; the scan executor only needs to
//! resolve a row id handed out by an index into a borrowed row. `RowSource`
//! is that seam. `Table` is the simple row-vector implementation used by
//! the CLI and tests.

mod errors;

pub use errors::{TableError, TableResult};

use serde::{Deserialize, Serialize};

use crate::types::{ColumnType, Row, RowId, Value};

/// Read access to stored rows by id
pub trait RowSource {
    /// Fetch a stored row. `None` means the id does not resolve.
    fn fetch(&self, id: RowId) -> Option<&StoredRow>;

    /// Number of columns in every row
    fn width(&self) -> usize;
}

/// A column declaration: `{"name": "a", "type": "varchar", "length": 8}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(flatten)]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A row plus its storage flags
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    row: Row,
    pending_delete: bool,
}

impl StoredRow {
    /// The row's values
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Row was deleted by the current transaction but is still physically present
    pub fn is_pending_delete(&self) -> bool {
        self.pending_delete
    }
}

/// Append-only in-memory table
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<ColumnDef>,
    rows: Vec<StoredRow>,
}

impl Table {
    /// Creates an empty table
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Insert a row, coercing each value to its column type.
    ///
    /// Row ids are assigned in insertion order.
    pub fn insert(&mut self, values: Vec<Value>) -> TableResult<RowId> {
        if values.len() != self.columns.len() {
            return Err(TableError::WidthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let coerced = values
            .into_iter()
            .zip(&self.columns)
            .map(|(value, column)| {
                column
                    .column_type
                    .coerce(value)
                    .map_err(|source| TableError::Coercion {
                        column: column.name.clone(),
                        source,
                    })
            })
            .collect::<TableResult<Vec<_>>>()?;

        let id = RowId(self.rows.len() as u64);
        self.rows.push(StoredRow {
            row: Row::new(coerced),
            pending_delete: false,
        });
        Ok(id)
    }

    /// Flag a row as deleted by an in-flight transaction
    pub fn mark_pending_delete(&mut self, id: RowId) -> TableResult<()> {
        let stored = self
            .rows
            .get_mut(id.0 as usize)
            .ok_or(TableError::UnknownRow(id))?;
        stored.pending_delete = true;
        Ok(())
    }

    /// Iterate live and pending-delete rows in id order
    pub fn iter(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, stored)| (RowId(i as u64), &stored.row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSource for Table {
    fn fetch(&self, id: RowId) -> Option<&StoredRow> {
        self.rows.get(id.0 as usize)
    }

    fn width(&self) -> usize {
        self.columns.len()
    }
}
