//! Column types and value coercion

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::CoercionError;
use super::value::Value;

/// 2^63, the first double past the BIGINT range
const I64_UPPER_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;

/// Declared type of a table or index key column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Boolean,
    /// Variable-length string with a maximum length in characters
    Varchar { length: usize },
}

impl ColumnType {
    /// Integer bounds for the integral types
    fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            ColumnType::TinyInt => Some((i8::MIN as i64, i8::MAX as i64)),
            ColumnType::SmallInt => Some((i16::MIN as i64, i16::MAX as i64)),
            ColumnType::Integer => Some((i32::MIN as i64, i32::MAX as i64)),
            ColumnType::BigInt => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Smallest non-null value of the column, when the type is bounded
    pub fn min_value(&self) -> Option<Value> {
        self.integer_bounds().map(|(min, _)| Value::Integer(min))
    }

    /// Largest value of the column, when the type is bounded
    pub fn max_value(&self) -> Option<Value> {
        self.integer_bounds().map(|(_, max)| Value::Integer(max))
    }

    /// Coerce a value into this column type.
    ///
    /// NULL coerces to every type.
    pub fn coerce(&self, value: Value) -> Result<Value, CoercionError> {
        if value.is_null() {
            return Ok(value);
        }

        if let Some((min, max)) = self.integer_bounds() {
            return match value {
                Value::Integer(i) if i > max => Err(self.overflow(&value)),
                Value::Integer(i) if i < min => Err(self.underflow(&value)),
                Value::Integer(_) => Ok(value),
                Value::Double(d) if d.is_finite() && d.fract() == 0.0 => {
                    // i64::MAX is not representable as f64
                    if d >= I64_UPPER_EXCLUSIVE {
                        return Err(self.overflow(&value));
                    }
                    if d < -I64_UPPER_EXCLUSIVE {
                        return Err(self.underflow(&value));
                    }
                    let i = d as i64;
                    if i > max {
                        Err(self.overflow(&value))
                    } else if i < min {
                        Err(self.underflow(&value))
                    } else {
                        Ok(Value::Integer(i))
                    }
                }
                other => Err(self.incompatible(&other)),
            };
        }

        match (self, value) {
            (ColumnType::Double, Value::Integer(i)) => Ok(Value::Double(i as f64)),
            (ColumnType::Double, v @ Value::Double(_)) => Ok(v),
            (ColumnType::Boolean, v @ Value::Boolean(_)) => Ok(v),
            (ColumnType::Varchar { length }, Value::Varchar(s)) => {
                let actual = s.chars().count();
                if actual > *length {
                    Err(CoercionError::VarLengthMismatch {
                        actual,
                        column: self.to_string(),
                    })
                } else {
                    Ok(Value::Varchar(s))
                }
            }
            (_, other) => Err(self.incompatible(&other)),
        }
    }

    /// Shrink a too-long string to the column length.
    ///
    /// Values that are not strings, or already fit, are returned unchanged.
    pub fn shrink(&self, value: Value) -> Value {
        match (self, value) {
            (ColumnType::Varchar { length }, Value::Varchar(s)) => {
                Value::Varchar(s.chars().take(*length).collect())
            }
            (_, other) => other,
        }
    }

    fn overflow(&self, value: &Value) -> CoercionError {
        CoercionError::Overflow {
            value: value.to_string(),
            column: self.to_string(),
        }
    }

    fn underflow(&self, value: &Value) -> CoercionError {
        CoercionError::Underflow {
            value: value.to_string(),
            column: self.to_string(),
        }
    }

    fn incompatible(&self, value: &Value) -> CoercionError {
        CoercionError::Incompatible {
            from: value.type_name().to_string(),
            to: self.to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::TinyInt => write!(f, "TINYINT"),
            ColumnType::SmallInt => write!(f, "SMALLINT"),
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::BigInt => write!(f, "BIGINT"),
            ColumnType::Double => write!(f, "DOUBLE"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
            ColumnType::Varchar { length } => write!(f, "VARCHAR({})", length),
        }
    }
}
