//! Expression evaluation errors

use thiserror::Error;

use crate::types::CoercionError;

/// Result type for expression evaluation
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Errors raised while evaluating an expression.
///
/// All of them are fatal to the current scan invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// Parameter index not bound for this invocation
    #[error("parameter {index} is not bound ({count} parameters supplied)")]
    ParameterOutOfRange { index: usize, count: usize },

    /// Column index past the end of the row
    #[error("column {index} is out of range for a row of width {width}")]
    ColumnOutOfRange { index: usize, width: usize },

    /// Column reference evaluated where no row is in scope
    #[error("column {index} referenced outside of a row context")]
    NoRowInScope { index: usize },

    /// Operand kinds do not fit the operator
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Integer arithmetic overflowed
    #[error("numeric overflow in {0}")]
    NumericOverflow(&'static str),

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Value could not be stored in a typed slot
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}
