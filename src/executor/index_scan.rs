//! Index scan executor
//!
//! Orchestrates one logical scan over an index:
//! 1. Build the search key once (new logical scans only)
//! 2. Position the cursor
//! 3. Loop: walker step, suspension check, row fetch, row filters, pipeline
//! 4. Report exhausted, limit-reached or suspended
//!
//! A suspended scan keeps its cursor, its pending candidate and its
//! postfilter counts; the next call resumes without touching the key.

use std::sync::Arc;

use crate::expression::Expression;
use crate::index::{IndexCursor, TableIndex};
use crate::observability::{log_event_with_fields, Event, EventFields, ScanMetrics};
use crate::planner::IndexScanPlanNode;
use crate::table::RowSource;
use crate::types::{Row, RowId, Value};

use super::aggregate::{InlineAggregator, SerialAggregator};
use super::config::ScanConfig;
use super::errors::{ExecutorError, ExecutorResult};
use super::fragment::FragmentExecutor;
use super::pipeline::{OutputPipeline, RowFate};
use super::postfilter::CountingPostfilter;
use super::projection::Projector;
use super::result::{InvocationResult, InvocationStats, ScanStatus};
use super::search_key::{KeyOutcome, SearchKeyBuilder};
use super::suspension::SuspensionController;
use super::walker::IndexCursorWalker;

/// Lifecycle of one logical scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// No scan in progress
    Idle,
    /// Key evaluated and cursor positioned
    KeyBuilt,
    /// Inside an invocation
    Scanning,
    /// Yielded with rows remaining
    Suspended,
    Exhausted,
    LimitReached,
}

impl ScanPhase {
    /// Returns true if the next call starts a new logical scan
    pub fn starts_new_scan(&self) -> bool {
        !matches!(self, ScanPhase::Suspended)
    }
}

/// Executes an index-scan plan node against one index and its table
pub struct IndexScanExecutor<'a, I: TableIndex, R: RowSource> {
    plan: IndexScanPlanNode,
    index: &'a I,
    table: &'a R,
    keys: SearchKeyBuilder,
    cursor: IndexCursor,
    walker: Option<IndexCursorWalker>,
    pipeline: OutputPipeline,
    controller: SuspensionController,
    phase: ScanPhase,
    /// Candidate taken from the cursor but not yet processed
    pending: Option<RowId>,
    metrics: Arc<ScanMetrics>,
}

impl<'a, I: TableIndex, R: RowSource> IndexScanExecutor<'a, I, R> {
    /// Validate the plan against the index and table and prepare the executor.
    ///
    /// No scanning happens here; an invalid plan is rejected before any
    /// cursor is positioned.
    pub fn new(
        plan: IndexScanPlanNode,
        index: &'a I,
        table: &'a R,
        config: &ScanConfig,
    ) -> ExecutorResult<Self> {
        plan.validate()?;

        if plan.target_index != index.name() {
            return Err(ExecutorError::plan_invalid(format!(
                "plan targets index '{}' but was given '{}'",
                plan.target_index,
                index.name()
            )));
        }

        let key_columns = index.key_types().len();
        if plan.search_keys.len() > key_columns {
            return Err(ExecutorError::plan_invalid(format!(
                "{} search keys for index '{}' with {} key columns",
                plan.search_keys.len(),
                index.name(),
                key_columns
            )));
        }

        let width = table.width();
        let filters = [
            ("end_expression", &plan.end_expression),
            ("predicate", &plan.predicate),
            ("skip_null_predicate", &plan.skip_null_predicate),
        ];
        for (name, expr) in filters {
            if let Some(column) = expr.as_ref().and_then(Expression::max_column_index) {
                if column >= width {
                    return Err(ExecutorError::plan_invalid(format!(
                        "{} reads column {} of a {}-column table",
                        name, column, width
                    )));
                }
            }
        }

        let projector = Projector::new(plan.projection.as_deref(), width)?;
        let aggregator: Option<Box<dyn InlineAggregator>> = match plan.aggregate {
            Some(ref spec) => {
                if let Some(column) = spec.max_column_index() {
                    if column >= projector.output_width() {
                        return Err(ExecutorError::plan_invalid(format!(
                            "aggregate reads column {} of a {}-column row",
                            column,
                            projector.output_width()
                        )));
                    }
                }
                Some(Box::new(SerialAggregator::new(spec.clone())))
            }
            None => None,
        };

        let controller = if plan.suspendable {
            let threshold = plan
                .suspend_threshold
                .unwrap_or(config.default_suspend_threshold);
            if threshold <= 0 {
                return Err(ExecutorError::plan_invalid(format!(
                    "suspendable scan needs a positive threshold, got {}",
                    threshold
                )));
            }
            SuspensionController::suspending_after(threshold as u64)
        } else {
            SuspensionController::never()
        };

        Ok(Self {
            plan,
            index,
            table,
            keys: SearchKeyBuilder::with_capacity(config.key_buffer_capacity),
            cursor: IndexCursor::new(),
            walker: None,
            pipeline: OutputPipeline::new(projector, aggregator),
            controller,
            phase: ScanPhase::Idle,
            pending: None,
            metrics: Arc::new(ScanMetrics::new()),
        })
    }

    /// Share a metrics registry with other executors
    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the inline aggregation collaborator
    pub fn with_aggregator(mut self, aggregator: Box<dyn InlineAggregator>) -> Self {
        let projector = self.pipeline.projector().clone();
        self.pipeline = OutputPipeline::new(projector, Some(aggregator));
        self
    }

    pub fn plan(&self) -> &IndexScanPlanNode {
        &self.plan
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Cursor state, for inspection
    pub fn cursor(&self) -> &IndexCursor {
        &self.cursor
    }

    pub fn metrics(&self) -> &Arc<ScanMetrics> {
        &self.metrics
    }

    /// Rows emitted so far in the current logical scan
    pub fn rows_emitted(&self) -> u64 {
        self.pipeline.postfilter().emitted()
    }

    /// Run one invocation
    pub fn execute(&mut self, params: &[Value]) -> ExecutorResult<InvocationResult> {
        self.metrics.increment_invocations();
        match self.run(params) {
            Ok(result) => Ok(result),
            Err(err) => {
                self.metrics.increment_failures();
                let message = err.to_string();
                log_event_with_fields(
                    Event::ScanFailed,
                    &EventFields {
                        error: Some(message.as_str()),
                        ..EventFields::for_index(self.index.name())
                    },
                );
                self.discard();
                Err(err)
            }
        }
    }

    /// Discard the current logical scan; the next call starts over
    pub fn cancel(&mut self) {
        if self.phase != ScanPhase::Idle {
            self.metrics.increment_cancellations();
            log_event_with_fields(Event::ScanCancelled, &EventFields::for_index(self.index.name()));
        }
        self.discard();
    }

    fn discard(&mut self) {
        self.cursor.reset();
        self.keys.clear();
        self.walker = None;
        self.pending = None;
        self.pipeline.reset();
        self.phase = ScanPhase::Idle;
    }

    fn run(&mut self, params: &[Value]) -> ExecutorResult<InvocationResult> {
        if self.phase.starts_new_scan() {
            self.begin_scan(params)?;
        } else {
            log_event_with_fields(Event::ScanResume, &EventFields::for_index(self.index.name()));
        }

        self.controller.begin_invocation();
        self.phase = ScanPhase::Scanning;

        let mut rows = Vec::new();
        let mut stats = InvocationStats::default();
        let status = self.scan(params, &mut rows, &mut stats)?;

        if status.is_terminal() {
            self.pipeline.finish(&mut rows)?;
            self.metrics.increment_scans_completed();
        } else {
            self.metrics.increment_suspensions();
        }
        self.metrics.add_rows_scanned(stats.rows_scanned);
        self.metrics.add_rows_emitted(stats.rows_emitted);
        self.metrics.add_rows_skipped_by_offset(stats.rows_skipped_by_offset);

        let (phase, event) = match status {
            ScanStatus::Exhausted => (ScanPhase::Exhausted, Event::ScanExhausted),
            ScanStatus::LimitReached => (ScanPhase::LimitReached, Event::ScanLimitReached),
            ScanStatus::Suspended => (ScanPhase::Suspended, Event::ScanSuspend),
        };
        self.phase = phase;
        log_event_with_fields(
            event,
            &EventFields {
                rows_scanned: Some(stats.rows_scanned),
                ..EventFields::for_index(self.index.name())
            },
        );

        Ok(InvocationResult {
            rows,
            status,
            stats,
        })
    }

    /// Reset per-scan state, build the key and position the cursor
    fn begin_scan(&mut self, params: &[Value]) -> ExecutorResult<()> {
        self.discard();
        self.metrics.increment_scans_started();
        log_event_with_fields(
            Event::ScanStart,
            &EventFields {
                lookup: Some(self.plan.lookup_type.as_str()),
                direction: Some(self.plan.sort_direction.as_str()),
                ..EventFields::for_index(self.index.name())
            },
        );

        self.pipeline
            .start(CountingPostfilter::resolve(self.plan.limit.as_ref(), params)?);

        if !self.plan.empty_scan {
            let outcome = self.keys.build(&self.plan, self.index.key_types(), params)?;
            if let KeyOutcome::Ready(resolved) = outcome {
                let walker = IndexCursorWalker::new(resolved);
                walker.position(
                    self.index,
                    &self.keys,
                    self.plan.sort_direction.scan_direction(),
                    &mut self.cursor,
                );
                self.walker = Some(walker);
            }
        }
        self.phase = ScanPhase::KeyBuilt;
        Ok(())
    }

    fn scan(
        &mut self,
        params: &[Value],
        rows: &mut Vec<Row>,
        stats: &mut InvocationStats,
    ) -> ExecutorResult<ScanStatus> {
        let Some(walker) = self.walker else {
            return Ok(ScanStatus::Exhausted);
        };
        let index = self.index;
        let table = self.table;

        loop {
            if !self.pipeline.is_under_limit() {
                return Ok(ScanStatus::LimitReached);
            }

            let id = match self.pending.take() {
                Some(id) => id,
                None => match walker.next(index, &mut self.cursor) {
                    Some(id) => id,
                    None => return Ok(ScanStatus::Exhausted),
                },
            };

            if self.controller.should_suspend() {
                self.pending = Some(id);
                return Ok(ScanStatus::Suspended);
            }
            self.controller.record();
            stats.rows_scanned += 1;

            let Some(stored) = table.fetch(id) else {
                self.metrics.increment_index_inconsistencies();
                log_event_with_fields(
                    Event::IndexInconsistency,
                    &EventFields {
                        row: Some(id.0),
                        ..EventFields::for_index(index.name())
                    },
                );
                self.cursor.exhaust();
                return Ok(ScanStatus::Exhausted);
            };
            if stored.is_pending_delete() {
                continue;
            }
            let row = stored.row();

            if let Some(ref expr) = self.plan.skip_null_predicate {
                if holds(expr, row, params, "skip-null predicate")? {
                    continue;
                }
            }
            if let Some(ref expr) = self.plan.end_expression {
                if !holds(expr, row, params, "end expression")? {
                    self.cursor.exhaust();
                    return Ok(ScanStatus::Exhausted);
                }
            }
            if let Some(ref expr) = self.plan.predicate {
                if !holds(expr, row, params, "predicate")? {
                    continue;
                }
            }

            match self.pipeline.process(row, params, rows)? {
                RowFate::Emitted => stats.rows_emitted += 1,
                RowFate::SkippedByOffset => stats.rows_skipped_by_offset += 1,
                RowFate::LimitReached => return Ok(ScanStatus::LimitReached),
            }
        }
    }
}

/// Evaluate a row filter; only `TRUE` holds
fn holds(expr: &Expression, row: &Row, params: &[Value], what: &str) -> ExecutorResult<bool> {
    expr.eval(Some(row), params)
        .map(|value| value.is_true())
        .map_err(|e| ExecutorError::expression_failed(what, e))
}

impl<'a, I: TableIndex, R: RowSource> FragmentExecutor for IndexScanExecutor<'a, I, R> {
    fn execute(&mut self, params: &[Value]) -> ExecutorResult<InvocationResult> {
        IndexScanExecutor::execute(self, params)
    }

    fn is_suspendable(&self) -> bool {
        self.controller.is_suspendable()
    }

    fn cancel(&mut self) {
        IndexScanExecutor::cancel(self)
    }
}

impl<'a, I: TableIndex, R: RowSource> std::fmt::Debug for IndexScanExecutor<'a, I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexScanExecutor")
            .field("index", &self.index.name())
            .field("phase", &self.phase)
            .field("cursor", &self.cursor)
            .field("pending", &self.pending)
            .finish()
    }
}
