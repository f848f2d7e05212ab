//! Coercion errors raised when a value is stored into a typed slot

use thiserror::Error;

/// Failure to coerce a value into a column type.
///
/// Overflow, underflow and var-length mismatch are "range" failures: the
/// value has the right kind but does not fit. The search key builder treats
/// those specially; everything else is a plain type error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// Value is above the column's maximum
    #[error("value {value} overflows {column}")]
    Overflow { value: String, column: String },

    /// Value is below the column's minimum
    #[error("value {value} underflows {column}")]
    Underflow { value: String, column: String },

    /// String is longer than the column allows
    #[error("string of length {actual} exceeds {column}")]
    VarLengthMismatch { actual: usize, column: String },

    /// Value kind cannot be stored in the column at all
    #[error("cannot coerce {from} to {to}")]
    Incompatible { from: String, to: String },
}

impl CoercionError {
    /// Returns true for overflow, underflow and var-length mismatch
    pub fn is_out_of_range(&self) -> bool {
        !matches!(self, CoercionError::Incompatible { .. })
    }
}
