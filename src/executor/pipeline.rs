//! Output pipeline
//!
//! Per candidate row, in strict order:
//! 1. Projection (or passthrough)
//! 2. Offset/limit postfilter
//! 3. Inline aggregation if configured, else append to the invocation output

use crate::types::{Row, Value};

use super::aggregate::InlineAggregator;
use super::errors::ExecutorResult;
use super::postfilter::CountingPostfilter;
use super::projection::Projector;

/// What happened to a row handed to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFate {
    /// Appended to the output or folded into the aggregate
    Emitted,
    /// Dropped by the offset
    SkippedByOffset,
    /// Dropped because the limit was already reached
    LimitReached,
}

/// Projection, postfilter and aggregation for one executor
pub struct OutputPipeline {
    projector: Projector,
    postfilter: CountingPostfilter,
    aggregator: Option<Box<dyn InlineAggregator>>,
}

impl OutputPipeline {
    pub fn new(projector: Projector, aggregator: Option<Box<dyn InlineAggregator>>) -> Self {
        Self {
            projector,
            postfilter: CountingPostfilter::unlimited(),
            aggregator,
        }
    }

    /// Begin a new logical scan with fresh offset/limit state
    pub fn start(&mut self, postfilter: CountingPostfilter) {
        self.postfilter = postfilter;
        if let Some(ref mut aggregator) = self.aggregator {
            aggregator.reset();
        }
    }

    pub fn is_under_limit(&self) -> bool {
        self.postfilter.is_under_limit()
    }

    pub fn postfilter(&self) -> &CountingPostfilter {
        &self.postfilter
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Push one row through the pipeline
    pub fn process(&mut self, row: &Row, params: &[Value], out: &mut Vec<Row>) -> ExecutorResult<RowFate> {
        if !self.postfilter.is_under_limit() {
            return Ok(RowFate::LimitReached);
        }

        let projected = self.projector.project(row, params)?;

        let skipped_before = self.postfilter.skipped();
        if !self.postfilter.eval() {
            return Ok(if self.postfilter.skipped() > skipped_before {
                RowFate::SkippedByOffset
            } else {
                RowFate::LimitReached
            });
        }

        match self.aggregator {
            Some(ref mut aggregator) => aggregator.push(&projected)?,
            None => out.push(projected),
        }
        Ok(RowFate::Emitted)
    }

    /// Append the aggregated rows at the end of a logical scan
    pub fn finish(&mut self, out: &mut Vec<Row>) -> ExecutorResult<()> {
        if let Some(ref mut aggregator) = self.aggregator {
            out.extend(aggregator.finish()?);
        }
        Ok(())
    }

    /// Discard all scan state
    pub fn reset(&mut self) {
        self.postfilter = CountingPostfilter::unlimited();
        if let Some(ref mut aggregator) = self.aggregator {
            aggregator.reset();
        }
    }
}

impl std::fmt::Debug for OutputPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPipeline")
            .field("projector", &self.projector)
            .field("postfilter", &self.postfilter)
            .field("aggregate", &self.aggregator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SerialAggregator;
    use crate::planner::{AggregateCall, AggregateSpec, ProjectionColumn};

    fn row(v: i64) -> Row {
        Row::new(vec![Value::Integer(v), Value::Integer(v * 10)])
    }

    #[test]
    fn test_projection_then_offset_limit() {
        let columns = [ProjectionColumn::Column { index: 1 }];
        let mut pipeline =
            OutputPipeline::new(Projector::new(Some(&columns[..]), 2).unwrap(), None);
        pipeline.start(CountingPostfilter::new(Some(2), 1));

        let mut out = Vec::new();
        let fates: Vec<RowFate> = (1..=4)
            .map(|v| pipeline.process(&row(v), &[], &mut out).unwrap())
            .collect();
        assert_eq!(
            fates,
            vec![
                RowFate::SkippedByOffset,
                RowFate::Emitted,
                RowFate::Emitted,
                RowFate::LimitReached
            ]
        );
        assert_eq!(
            out,
            vec![
                Row::new(vec![Value::Integer(20)]),
                Row::new(vec![Value::Integer(30)])
            ]
        );
    }

    #[test]
    fn test_aggregate_buffers_nothing() {
        let aggregator = SerialAggregator::new(AggregateSpec {
            group_by: vec![],
            calls: vec![AggregateCall::Sum { column: 0 }],
        });
        let mut pipeline = OutputPipeline::new(Projector::passthrough(2), Some(Box::new(aggregator)));
        pipeline.start(CountingPostfilter::unlimited());

        let mut out = Vec::new();
        for v in 1..=3 {
            pipeline.process(&row(v), &[], &mut out).unwrap();
        }
        assert!(out.is_empty());
        pipeline.finish(&mut out).unwrap();
        assert_eq!(out, vec![Row::new(vec![Value::Integer(6)])]);
    }

    #[test]
    fn test_start_resets_aggregate() {
        let aggregator = SerialAggregator::new(AggregateSpec {
            group_by: vec![],
            calls: vec![AggregateCall::CountStar],
        });
        let mut pipeline = OutputPipeline::new(Projector::passthrough(2), Some(Box::new(aggregator)));
        let mut out = Vec::new();
        pipeline.process(&row(1), &[], &mut out).unwrap();
        pipeline.start(CountingPostfilter::unlimited());
        pipeline.finish(&mut out).unwrap();
        assert_eq!(out, vec![Row::new(vec![Value::Integer(0)])]);
    }
}
