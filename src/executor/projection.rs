//! Inline projection

use crate::planner::ProjectionColumn;
use crate::types::{Row, Value};

use super::errors::{ExecutorError, ExecutorResult};

/// Resolved projection. `None` columns means passthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    columns: Option<Vec<ProjectionColumn>>,
    output_width: usize,
}

impl Projector {
    /// Passthrough of rows `input_width` wide
    pub fn passthrough(input_width: usize) -> Self {
        Self {
            columns: None,
            output_width: input_width,
        }
    }

    /// Resolve a projection against the input row width.
    ///
    /// Fails if any column or expression reads past the input row.
    pub fn new(columns: Option<&[ProjectionColumn]>, input_width: usize) -> ExecutorResult<Self> {
        let Some(columns) = columns else {
            return Ok(Self::passthrough(input_width));
        };

        let mut output_width = 0;
        for (position, column) in columns.iter().enumerate() {
            let read = match column {
                ProjectionColumn::Column { index } => Some(*index),
                ProjectionColumn::Expression { expr } => expr.max_column_index(),
                ProjectionColumn::AllColumns => None,
            };
            if let Some(index) = read {
                if index >= input_width {
                    return Err(ExecutorError::plan_invalid(format!(
                        "projection column {} reads input column {} of {}",
                        position, index, input_width
                    )));
                }
            }
            output_width += match column {
                ProjectionColumn::AllColumns => input_width,
                _ => 1,
            };
        }

        Ok(Self {
            columns: Some(columns.to_vec()),
            output_width,
        })
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    pub fn is_passthrough(&self) -> bool {
        self.columns.is_none()
    }

    /// Build the output row for `row`
    pub fn project(&self, row: &Row, params: &[Value]) -> ExecutorResult<Row> {
        let Some(ref columns) = self.columns else {
            return Ok(row.clone());
        };

        let mut values = Vec::with_capacity(self.output_width);
        for (position, column) in columns.iter().enumerate() {
            match column {
                ProjectionColumn::Column { index } => {
                    values.push(row.get(*index).cloned().unwrap_or(Value::Null));
                }
                ProjectionColumn::Expression { expr } => {
                    let value = expr.eval(Some(row), params).map_err(|e| {
                        ExecutorError::expression_failed(format!("projection column {}", position), e)
                    })?;
                    values.push(value);
                }
                ProjectionColumn::AllColumns => values.extend_from_slice(row.values()),
            }
        }
        Ok(Row::new(values))
    }
}
