//! Search key construction
//!
//! Evaluates the plan's search-key expressions (and, for range lookups, its
//! end-key expressions) into typed key buffers. Buffers are owned by the
//! executor and reused across logical scans.
//!
//! A value that does not fit its key column is either absorbed by adjusting
//! the lookup (clamping or truncating the last slot) or turns the scan into
//! an empty one. Only incompatible types are errors.

use crate::expression::{Expression, ExpressionError};
use crate::index::SearchKey;
use crate::observability::{log_event_with_fields, Event, EventFields};
use crate::planner::{IndexScanPlanNode, LookupType};
use crate::types::{CoercionError, ColumnType, Value};

use super::errors::{ExecutorError, ExecutorResult};

/// Lookup as positioned after key adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLookup {
    pub lookup: LookupType,
    /// Number of key slots filled; zero means a full index walk
    pub active_keys: usize,
    /// Range lookups only: the search key bound is inclusive
    pub lower_inclusive: bool,
    /// Range lookups only: the end key bound is inclusive
    pub upper_inclusive: bool,
}

/// Result of building the keys for one logical scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ready(ResolvedLookup),
    /// No row can match; skip positioning entirely
    Empty,
}

/// Evaluated slot before NULL and range checks
enum Slot {
    Fits(Value),
    OutOfRange { error: CoercionError, raw: Value },
}

/// Reusable search-key and end-key buffers
#[derive(Debug, Default)]
pub struct SearchKeyBuilder {
    key: Vec<Value>,
    end_key: Vec<Value>,
}

impl SearchKeyBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            key: Vec::with_capacity(capacity),
            end_key: Vec::with_capacity(capacity),
        }
    }

    /// Search key built by the last successful `build`
    pub fn key(&self) -> SearchKey<'_> {
        SearchKey::new(&self.key)
    }

    /// End key of a range lookup
    pub fn end_key(&self) -> SearchKey<'_> {
        SearchKey::new(&self.end_key)
    }

    /// Empty both buffers, keeping their allocations
    pub fn clear(&mut self) {
        self.key.clear();
        self.end_key.clear();
    }

    /// Evaluate the keys for a new logical scan
    pub fn build(
        &mut self,
        plan: &IndexScanPlanNode,
        key_types: &[ColumnType],
        params: &[Value],
    ) -> ExecutorResult<KeyOutcome> {
        self.clear();

        let active = plan.search_keys.len();
        if active > key_types.len() {
            return Err(ExecutorError::plan_invalid(format!(
                "{} search keys for an index with {} key columns",
                active,
                key_types.len()
            )));
        }

        let mut resolved = ResolvedLookup {
            lookup: plan.lookup_type,
            active_keys: active,
            lower_inclusive: true,
            upper_inclusive: plan.end_inclusive,
        };

        for (slot, expr) in plan.search_keys.iter().enumerate() {
            let value = match eval_slot(expr, key_types[slot], params, "search key", slot)? {
                Slot::Fits(value) => value,
                Slot::OutOfRange { error, raw } => {
                    let last = slot + 1 == active;
                    let adjusted = if last {
                        adjust_start(&mut resolved, key_types[slot], &error, raw)
                    } else {
                        None
                    };
                    match adjusted {
                        Some(value) => {
                            note_out_of_range(slot, &error, "adjusted");
                            value
                        }
                        None => {
                            note_out_of_range(slot, &error, "empty");
                            return Ok(KeyOutcome::Empty);
                        }
                    }
                }
            };
            if value.is_null() && !plan.compare_not_distinct_at(slot) {
                return Ok(KeyOutcome::Empty);
            }
            self.key.push(value);
        }

        if resolved.lookup == LookupType::Range {
            let count = plan.end_keys.len();
            for (slot, expr) in plan.end_keys.iter().enumerate() {
                let column_type = key_types.get(slot).copied().ok_or_else(|| {
                    ExecutorError::plan_invalid(format!("end key {} has no key column", slot))
                })?;
                let value = match eval_slot(expr, column_type, params, "end key", slot)? {
                    Slot::Fits(value) => value,
                    Slot::OutOfRange { error, raw } => {
                        let adjusted = if slot + 1 == count {
                            adjust_end(&mut resolved, column_type, &error, raw)
                        } else {
                            None
                        };
                        match adjusted {
                            Some(value) => value,
                            None => {
                                note_out_of_range(slot, &error, "empty");
                                return Ok(KeyOutcome::Empty);
                            }
                        }
                    }
                };
                if value.is_null() && !plan.compare_not_distinct_at(slot) {
                    return Ok(KeyOutcome::Empty);
                }
                self.end_key.push(value);
            }
        }

        Ok(KeyOutcome::Ready(resolved))
    }
}

fn eval_slot(
    expr: &Expression,
    column_type: ColumnType,
    params: &[Value],
    what: &str,
    slot: usize,
) -> ExecutorResult<Slot> {
    let raw = expr
        .eval(None, params)
        .map_err(|e| ExecutorError::expression_failed(format!("{} {}", what, slot), e))?;
    match column_type.coerce(raw.clone()) {
        Ok(value) => Ok(Slot::Fits(value)),
        Err(error) if error.is_out_of_range() => Ok(Slot::OutOfRange { error, raw }),
        Err(error) => Err(ExecutorError::expression_failed(
            format!("{} {}", what, slot),
            ExpressionError::Coercion(error),
        )),
    }
}

/// Rewrite the last search-key slot so the lookup still selects exactly the
/// rows it would have selected with the unrepresentable value.
fn adjust_start(
    resolved: &mut ResolvedLookup,
    column_type: ColumnType,
    error: &CoercionError,
    raw: Value,
) -> Option<Value> {
    use LookupType::*;

    match (error, resolved.lookup) {
        (CoercionError::Overflow { .. }, Less | LessEqual) => {
            resolved.lookup = LessEqual;
            column_type.max_value()
        }
        (CoercionError::Underflow { .. }, Greater | GreaterEqual) => {
            resolved.lookup = GreaterEqual;
            column_type.min_value()
        }
        (CoercionError::Underflow { .. }, Range) => {
            resolved.lower_inclusive = true;
            column_type.min_value()
        }
        (CoercionError::VarLengthMismatch { .. }, Less | LessEqual) => {
            resolved.lookup = LessEqual;
            Some(column_type.shrink(raw))
        }
        (CoercionError::VarLengthMismatch { .. }, Greater | GreaterEqual) => {
            resolved.lookup = Greater;
            Some(column_type.shrink(raw))
        }
        (CoercionError::VarLengthMismatch { .. }, Range) => {
            resolved.lower_inclusive = false;
            Some(column_type.shrink(raw))
        }
        // overflow on a lower bound, underflow on an upper bound, equality
        _ => None,
    }
}

fn adjust_end(
    resolved: &mut ResolvedLookup,
    column_type: ColumnType,
    error: &CoercionError,
    raw: Value,
) -> Option<Value> {
    match error {
        CoercionError::Overflow { .. } => {
            resolved.upper_inclusive = true;
            column_type.max_value()
        }
        CoercionError::VarLengthMismatch { .. } => {
            resolved.upper_inclusive = true;
            Some(column_type.shrink(raw))
        }
        _ => None,
    }
}

fn note_out_of_range(slot: usize, error: &CoercionError, action: &str) {
    let reason = error.to_string();
    log_event_with_fields(
        Event::SearchKeyOutOfRange,
        &EventFields {
            slot: Some(slot as u64),
            reason: Some(reason.as_str()),
            action: Some(action),
            ..EventFields::default()
        },
    );
}
