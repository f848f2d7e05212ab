//! Table errors

use thiserror::Error;

use crate::types::{CoercionError, RowId};

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// Row has the wrong number of values
    #[error("expected {expected} values, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    /// A value does not fit its column
    #[error("column '{column}': {source}")]
    Coercion {
        column: String,
        #[source]
        source: CoercionError,
    },

    /// Row id does not exist
    #[error("unknown row {0:?}")]
    UnknownRow(RowId),
}
