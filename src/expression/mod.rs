//! Expression trees evaluated by the scan executor
//!
//! Expressions arrive serialized inside plan nodes. They are evaluated
//! against an optional row (search keys have none) and the parameter vector
//! of the current invocation.
//!
//! Boolean logic is three-valued: comparisons involving NULL yield NULL, and
//! only `TRUE` counts as a match.

mod errors;
mod expr;

pub use errors::{ExpressionError, ExpressionResult};
pub use expr::{ArithmeticOp, CompareOp, Expression};
