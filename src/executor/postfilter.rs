//! Inline offset/limit
//!
//! Counts are kept for the whole logical scan, so they carry across
//! suspended invocations.

use crate::expression::ExpressionError;
use crate::planner::LimitSpec;
use crate::types::Value;

use super::errors::{ExecutorError, ExecutorResult};

/// Offset/limit counter for one logical scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountingPostfilter {
    limit: Option<u64>,
    offset: u64,
    skipped: u64,
    emitted: u64,
}

impl CountingPostfilter {
    pub fn new(limit: Option<u64>, offset: u64) -> Self {
        Self {
            limit,
            offset,
            skipped: 0,
            emitted: 0,
        }
    }

    /// No offset, no limit
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Build from the plan's limit spec, reading parameterized values from `params`
    pub fn resolve(spec: Option<&LimitSpec>, params: &[Value]) -> ExecutorResult<Self> {
        let Some(spec) = spec else {
            return Ok(Self::unlimited());
        };
        let limit = match spec.limit_param {
            Some(index) => Some(count_param(params, index, "limit")?),
            None => spec.limit.map(|l| l.max(0) as u64),
        };
        let offset = match spec.offset_param {
            Some(index) => count_param(params, index, "offset")?,
            None => spec.offset.max(0) as u64,
        };
        Ok(Self::new(limit, offset))
    }

    /// Returns true while more rows may be emitted
    pub fn is_under_limit(&self) -> bool {
        self.limit.map_or(true, |limit| self.emitted < limit)
    }

    /// Decide the fate of the next row. Returns true if it is emitted.
    pub fn eval(&mut self) -> bool {
        if self.skipped < self.offset {
            self.skipped += 1;
            return false;
        }
        if !self.is_under_limit() {
            return false;
        }
        self.emitted += 1;
        true
    }

    /// Rows dropped by the offset so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Rows passed so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

fn count_param(params: &[Value], index: usize, what: &str) -> ExecutorResult<u64> {
    let value = params.get(index).ok_or_else(|| {
        ExecutorError::expression_failed(
            what,
            ExpressionError::ParameterOutOfRange {
                index,
                count: params.len(),
            },
        )
    })?;
    match value.as_i64() {
        Some(n) if n >= 0 => Ok(n as u64),
        _ => Err(ExecutorError::expression_failed(
            what,
            ExpressionError::TypeMismatch(format!(
                "{} must be a non-negative integer, got {}",
                what, value
            )),
        )),
    }
}
