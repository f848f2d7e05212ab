//! Inline aggregation
//!
//! When a plan folds an aggregate into the scan, rows are pushed into the
//! aggregator instead of being buffered. The aggregated rows are produced
//! only when the logical scan ends.

use std::collections::BTreeMap;

use crate::planner::{AggregateCall, AggregateSpec};
use crate::types::{Row, Value};

use super::errors::{ExecutorError, ExecutorResult};

/// Aggregation collaborator driven by the output pipeline
pub trait InlineAggregator {
    /// Fold one (projected) row into the aggregation state
    fn push(&mut self, row: &Row) -> ExecutorResult<()>;

    /// Produce the aggregated rows and clear the state
    fn finish(&mut self) -> ExecutorResult<Vec<Row>>;

    /// Drop all state
    fn reset(&mut self);
}

/// Running value of one aggregate call
#[derive(Debug, Clone, PartialEq)]
enum Accumulator {
    Count(i64),
    Sum(Option<Value>),
    Min(Option<Value>),
    Max(Option<Value>),
}

impl Accumulator {
    fn new(call: &AggregateCall) -> Self {
        match call {
            AggregateCall::CountStar | AggregateCall::Count { .. } => Accumulator::Count(0),
            AggregateCall::Sum { .. } => Accumulator::Sum(None),
            AggregateCall::Min { .. } => Accumulator::Min(None),
            AggregateCall::Max { .. } => Accumulator::Max(None),
        }
    }

    fn update(&mut self, call: &AggregateCall, row: &Row) -> ExecutorResult<()> {
        let input = match call.column() {
            Some(column) => row.get(column).ok_or_else(|| {
                ExecutorError::aggregation_failed(format!(
                    "aggregate reads column {} of a {}-column row",
                    column,
                    row.len()
                ))
            })?,
            None => {
                if let Accumulator::Count(n) = self {
                    *n += 1;
                }
                return Ok(());
            }
        };
        if input.is_null() {
            return Ok(());
        }

        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum(sum) => {
                let next = match sum.take() {
                    None => numeric(input)?,
                    Some(acc) => add(&acc, input)?,
                };
                *sum = Some(next);
            }
            Accumulator::Min(min) => {
                if min.as_ref().map_or(true, |m| input < m) {
                    *min = Some(input.clone());
                }
            }
            Accumulator::Max(max) => {
                if max.as_ref().map_or(true, |m| input > m) {
                    *max = Some(input.clone());
                }
            }
        }
        Ok(())
    }

    fn value(&self) -> Value {
        match self {
            Accumulator::Count(n) => Value::Integer(*n),
            Accumulator::Sum(v) | Accumulator::Min(v) | Accumulator::Max(v) => {
                v.clone().unwrap_or(Value::Null)
            }
        }
    }
}

fn numeric(value: &Value) -> ExecutorResult<Value> {
    match value {
        Value::Integer(_) | Value::Double(_) => Ok(value.clone()),
        other => Err(ExecutorError::aggregation_failed(format!(
            "cannot sum {}",
            other.type_name()
        ))),
    }
}

fn add(acc: &Value, input: &Value) -> ExecutorResult<Value> {
    match (acc, numeric(input)?) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(b)
            .map(Value::Integer)
            .ok_or_else(|| ExecutorError::aggregation_failed("integer overflow in sum")),
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Double(x + y)),
            _ => Err(ExecutorError::aggregation_failed("non-numeric sum")),
        },
    }
}

/// Grouped aggregation keyed by the group-by columns.
///
/// Groups are emitted in group-key order. Without group-by columns exactly
/// one row is produced, even for empty input.
#[derive(Debug, Clone)]
pub struct SerialAggregator {
    spec: AggregateSpec,
    groups: BTreeMap<Vec<Value>, Vec<Accumulator>>,
}

impl SerialAggregator {
    pub fn new(spec: AggregateSpec) -> Self {
        Self {
            spec,
            groups: BTreeMap::new(),
        }
    }

    /// Number of groups seen since the last finish or reset
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn fresh_accumulators(&self) -> Vec<Accumulator> {
        self.spec.calls.iter().map(Accumulator::new).collect()
    }
}

impl InlineAggregator for SerialAggregator {
    fn push(&mut self, row: &Row) -> ExecutorResult<()> {
        let key = self
            .spec
            .group_by
            .iter()
            .map(|&column| {
                row.get(column).cloned().ok_or_else(|| {
                    ExecutorError::aggregation_failed(format!(
                        "group-by column {} missing from a {}-column row",
                        column,
                        row.len()
                    ))
                })
            })
            .collect::<ExecutorResult<Vec<_>>>()?;

        if !self.groups.contains_key(&key) {
            let fresh = self.fresh_accumulators();
            self.groups.insert(key.clone(), fresh);
        }
        if let Some(accumulators) = self.groups.get_mut(&key) {
            for (acc, call) in accumulators.iter_mut().zip(&self.spec.calls) {
                acc.update(call, row)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ExecutorResult<Vec<Row>> {
        if self.groups.is_empty() && self.spec.group_by.is_empty() {
            let values = self.fresh_accumulators().iter().map(Accumulator::value).collect();
            return Ok(vec![Row::new(values)]);
        }

        let groups = std::mem::take(&mut self.groups);
        Ok(groups
            .into_iter()
            .map(|(mut key, accumulators)| {
                key.extend(accumulators.iter().map(Accumulator::value));
                Row::new(key)
            })
            .collect())
    }

    fn reset(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::new(vec![Value::varchar("b"), Value::Integer(2)]),
            Row::new(vec![Value::varchar("a"), Value::Integer(5)]),
            Row::new(vec![Value::varchar("b"), Value::Null]),
            Row::new(vec![Value::varchar("b"), Value::Integer(7)]),
        ]
    }

    fn spec(group_by: Vec<usize>) -> AggregateSpec {
        AggregateSpec {
            group_by,
            calls: vec![
                AggregateCall::CountStar,
                AggregateCall::Count { column: 1 },
                AggregateCall::Sum { column: 1 },
                AggregateCall::Min { column: 1 },
                AggregateCall::Max { column: 1 },
            ],
        }
    }

    #[test]
    fn test_ungrouped_aggregate() {
        let mut agg = SerialAggregator::new(spec(vec![]));
        for row in rows() {
            agg.push(&row).unwrap();
        }
        let out = agg.finish().unwrap();
        assert_eq!(
            out,
            vec![Row::new(vec![
                Value::Integer(4),
                Value::Integer(3),
                Value::Integer(14),
                Value::Integer(2),
                Value::Integer(7),
            ])]
        );
    }

    #[test]
    fn test_grouped_in_key_order() {
        let mut agg = SerialAggregator::new(spec(vec![0]));
        for row in rows() {
            agg.push(&row).unwrap();
        }
        assert_eq!(agg.group_count(), 2);
        let out = agg.finish().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get(0), Some(&Value::varchar("a")));
        assert_eq!(out[1].get(1), Some(&Value::Integer(3)));
        assert_eq!(agg.group_count(), 0);
    }

    #[test]
    fn test_empty_input() {
        let mut agg = SerialAggregator::new(spec(vec![]));
        let out = agg.finish().unwrap();
        assert_eq!(out[0].get(0), Some(&Value::Integer(0)));
        assert_eq!(out[0].get(2), Some(&Value::Null));

        let mut grouped = SerialAggregator::new(spec(vec![0]));
        assert!(grouped.finish().unwrap().is_empty());
    }

    #[test]
    fn test_reset_drops_groups() {
        let mut agg = SerialAggregator::new(spec(vec![0]));
        agg.push(&rows()[0]).unwrap();
        agg.reset();
        assert!(agg.finish().unwrap().is_empty());
    }

    #[test]
    fn test_sum_of_strings_fails() {
        let mut agg = SerialAggregator::new(AggregateSpec {
            group_by: vec![],
            calls: vec![AggregateCall::Sum { column: 0 }],
        });
        let err = agg.push(&Row::new(vec![Value::varchar("x")])).unwrap_err();
        assert_eq!(
            err.code(),
            crate::executor::ExecutorErrorCode::AeroAggregationFailed
        );
    }

    #[test]
    fn test_sum_widens_to_double() {
        let mut agg = SerialAggregator::new(AggregateSpec {
            group_by: vec![],
            calls: vec![AggregateCall::Sum { column: 0 }],
        });
        agg.push(&Row::new(vec![Value::Integer(1)])).unwrap();
        agg.push(&Row::new(vec![Value::Double(0.5)])).unwrap();
        assert_eq!(agg.finish().unwrap()[0].get(0), Some(&Value::Double(1.5)));
    }
}
