//! Typed values shared by expressions, indexes and the scan executor
//!
//! # Ordering
//!
//! Values have a total order so they can key an ordered index:
//! NULL < Boolean < numeric (Integer and Double compared numerically) < Varchar.

mod column;
mod errors;
mod row;
mod value;

pub use column::ColumnType;
pub use errors::CoercionError;
pub use row::{Row, RowId};
pub use value::Value;
