//! Expression tree and evaluator

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Row, Value};

use super::errors::{ExpressionError, ExpressionResult};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn test(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn name(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
        }
    }
}

/// A serializable expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Literal value
    Constant { value: Value },
    /// Invocation parameter, by position
    Parameter { index: usize },
    /// Column of the row in scope, by position
    Column { index: usize },
    /// Binary comparison
    Compare {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Binary arithmetic
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not { operand: Box<Expression> },
    IsNull { operand: Box<Expression> },
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant {
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Expression::Constant { value: Value::Null }
    }

    pub fn param(index: usize) -> Self {
        Expression::Parameter { index }
    }

    pub fn column(index: usize) -> Self {
        Expression::Column { index }
    }

    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expression, right: Expression) -> Self {
        Expression::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expression) -> Self {
        Expression::Not {
            operand: Box::new(operand),
        }
    }

    pub fn is_null(operand: Expression) -> Self {
        Expression::IsNull {
            operand: Box::new(operand),
        }
    }

    /// Highest column index referenced anywhere in the tree
    pub fn max_column_index(&self) -> Option<usize> {
        match self {
            Expression::Constant { .. } | Expression::Parameter { .. } => None,
            Expression::Column { index } => Some(*index),
            Expression::Compare { left, right, .. }
            | Expression::Arithmetic { left, right, .. }
            | Expression::And { left, right }
            | Expression::Or { left, right } => {
                match (left.max_column_index(), right.max_column_index()) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                }
            }
            Expression::Not { operand } | Expression::IsNull { operand } => {
                operand.max_column_index()
            }
        }
    }

    /// Returns true if the tree reads any column
    pub fn references_columns(&self) -> bool {
        self.max_column_index().is_some()
    }

    /// Evaluate against an optional row and the bound parameters
    pub fn eval(&self, row: Option<&Row>, params: &[Value]) -> ExpressionResult<Value> {
        match self {
            Expression::Constant { value } => Ok(value.clone()),
            Expression::Parameter { index } => params.get(*index).cloned().ok_or(
                ExpressionError::ParameterOutOfRange {
                    index: *index,
                    count: params.len(),
                },
            ),
            Expression::Column { index } => {
                let row = row.ok_or(ExpressionError::NoRowInScope { index: *index })?;
                row.get(*index)
                    .cloned()
                    .ok_or(ExpressionError::ColumnOutOfRange {
                        index: *index,
                        width: row.len(),
                    })
            }
            Expression::Compare { op, left, right } => {
                let l = left.eval(row, params)?;
                let r = right.eval(row, params)?;
                compare(*op, &l, &r)
            }
            Expression::Arithmetic { op, left, right } => {
                let l = left.eval(row, params)?;
                let r = right.eval(row, params)?;
                arithmetic(*op, l, r)
            }
            Expression::And { left, right } => {
                let l = as_logical(left.eval(row, params)?)?;
                if l == Some(false) {
                    return Ok(Value::Boolean(false));
                }
                let r = as_logical(right.eval(row, params)?)?;
                Ok(match (l, r) {
                    (_, Some(false)) => Value::Boolean(false),
                    (Some(true), Some(true)) => Value::Boolean(true),
                    _ => Value::Null,
                })
            }
            Expression::Or { left, right } => {
                let l = as_logical(left.eval(row, params)?)?;
                if l == Some(true) {
                    return Ok(Value::Boolean(true));
                }
                let r = as_logical(right.eval(row, params)?)?;
                Ok(match (l, r) {
                    (_, Some(true)) => Value::Boolean(true),
                    (Some(false), Some(false)) => Value::Boolean(false),
                    _ => Value::Null,
                })
            }
            Expression::Not { operand } => Ok(match as_logical(operand.eval(row, params)?)? {
                Some(b) => Value::Boolean(!b),
                None => Value::Null,
            }),
            Expression::IsNull { operand } => {
                Ok(Value::Boolean(operand.eval(row, params)?.is_null()))
            }
        }
    }
}

fn as_logical(value: Value) -> ExpressionResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(b)),
        other => Err(ExpressionError::TypeMismatch(format!(
            "expected BOOLEAN, found {}",
            other.type_name()
        ))),
    }
}

fn comparable(l: &Value, r: &Value) -> bool {
    matches!(
        (l, r),
        (Value::Boolean(_), Value::Boolean(_))
            | (Value::Integer(_) | Value::Double(_), Value::Integer(_) | Value::Double(_))
            | (Value::Varchar(_), Value::Varchar(_))
    )
}

fn compare(op: CompareOp, l: &Value, r: &Value) -> ExpressionResult<Value> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    if !comparable(l, r) {
        return Err(ExpressionError::TypeMismatch(format!(
            "cannot compare {} with {}",
            l.type_name(),
            r.type_name()
        )));
    }
    Ok(Value::Boolean(op.test(l.cmp(r))))
}

fn arithmetic(op: ArithmeticOp, l: Value, r: Value) -> ExpressionResult<Value> {
    match (&l, &r) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                ArithmeticOp::Add => a.checked_add(*b),
                ArithmeticOp::Subtract => a.checked_sub(*b),
                ArithmeticOp::Multiply => a.checked_mul(*b),
                ArithmeticOp::Divide => {
                    if *b == 0 {
                        return Err(ExpressionError::DivisionByZero);
                    }
                    a.checked_div(*b)
                }
            };
            result
                .map(Value::Integer)
                .ok_or(ExpressionError::NumericOverflow(op.name()))
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => {
                let result = match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Subtract => a - b,
                    ArithmeticOp::Multiply => a * b,
                    ArithmeticOp::Divide => {
                        if b == 0.0 {
                            return Err(ExpressionError::DivisionByZero);
                        }
                        a / b
                    }
                };
                Ok(Value::Double(result))
            }
            _ => Err(ExpressionError::TypeMismatch(format!(
                "cannot {} {} and {}",
                op.name(),
                l.type_name(),
                r.type_name()
            ))),
        },
    }
}
