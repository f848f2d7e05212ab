//! Suspension and Limit Tests
//!
//! Tests for multi-invocation scans:
//! - Suspended scans concatenate to the unsuspended result
//! - Offset and limit apply across the whole logical scan
//! - Parameterized limits are fixed when the scan starts
//! - Inline aggregation reports only on the terminal invocation
//! - Cancel discards a suspended scan

use aeroscan::executor::{
    run_to_completion, ExecutorResult, FragmentExecutor, IndexScanExecutor, InlineAggregator,
    InvocationResult, ScanConfig, ScanPhase, ScanStatus,
};
use aeroscan::expression::{CompareOp, Expression};
use aeroscan::index::BTreeIndex;
use aeroscan::planner::{
    AggregateCall, AggregateSpec, IndexScanPlanNode, LimitSpec, LookupType, SortDirection,
};
use aeroscan::table::{ColumnDef, Table};
use aeroscan::types::{ColumnType, Row, Value};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

/// Table (a INTEGER, pos INTEGER) where pos is the insertion position
fn table_of(values: &[i64]) -> (Table, BTreeIndex) {
    let mut table = Table::new(
        "t",
        vec![
            ColumnDef::new("a", ColumnType::Integer),
            ColumnDef::new("pos", ColumnType::Integer),
        ],
    );
    for (pos, a) in values.iter().enumerate() {
        table
            .insert(vec![Value::Integer(*a), Value::Integer(pos as i64)])
            .unwrap();
    }
    let index = BTreeIndex::build("idx_a", vec![0], &table).unwrap();
    (table, index)
}

/// Table (a INTEGER, b INTEGER, pos INTEGER) with a composite index on (a, b)
fn composite_table_of(pairs: &[(i64, i64)]) -> (Table, BTreeIndex) {
    let mut table = Table::new(
        "t",
        vec![
            ColumnDef::new("a", ColumnType::Integer),
            ColumnDef::new("b", ColumnType::Integer),
            ColumnDef::new("pos", ColumnType::Integer),
        ],
    );
    for (pos, (a, b)) in pairs.iter().enumerate() {
        table
            .insert(vec![Value::Integer(*a), Value::Integer(*b), Value::Integer(pos as i64)])
            .unwrap();
    }
    let index = BTreeIndex::build("idx_ab", vec![0, 1], &table).unwrap();
    (table, index)
}

fn lookup_strategy() -> impl Strategy<Value = LookupType> {
    prop_oneof![
        Just(LookupType::Equal),
        Just(LookupType::Greater),
        Just(LookupType::GreaterEqual),
        Just(LookupType::Less),
        Just(LookupType::LessEqual),
        Just(LookupType::Range),
        Just(LookupType::GeoContains),
    ]
}

fn from(key: i64) -> IndexScanPlanNode {
    IndexScanPlanNode::new("t", "idx_a", LookupType::GreaterEqual)
        .with_search_keys(vec![Expression::constant(key)])
}

fn run_all(
    plan: IndexScanPlanNode,
    table: &Table,
    index: &BTreeIndex,
    params: &[Value],
) -> Vec<InvocationResult> {
    let mut exec = IndexScanExecutor::new(plan, index, table, &ScanConfig::default()).unwrap();
    run_to_completion(&mut exec, params).unwrap()
}

fn concat(invocations: &[InvocationResult]) -> Vec<Row> {
    invocations.iter().flat_map(|r| r.rows.iter().cloned()).collect()
}

fn positions(rows: &[Row]) -> Vec<i64> {
    positions_at(rows, 1)
}

fn positions_at(rows: &[Row], col: usize) -> Vec<i64> {
    rows.iter().filter_map(|r| r.get(col).and_then(Value::as_i64)).collect()
}

// =============================================================================
// Suspension
// =============================================================================

/// Threshold 2 over four matching rows: two invocations of two rows each.
#[test]
fn test_four_rows_threshold_two() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let invocations = run_all(from(1).with_suspension(Some(2)), &table, &index, &[]);

    assert_eq!(invocations.len(), 2);
    assert_eq!(invocations[0].status, ScanStatus::Suspended);
    assert_eq!(positions(&invocations[0].rows), vec![0, 1]);
    assert_eq!(invocations[1].status, ScanStatus::Exhausted);
    assert_eq!(positions(&invocations[1].rows), vec![2, 3]);
}

/// A threshold that lands exactly on the last row does not suspend.
#[test]
fn test_threshold_equal_to_row_count_exhausts() {
    let (table, index) = table_of(&[1, 2, 3]);
    let invocations = run_all(from(1).with_suspension(Some(3)), &table, &index, &[]);
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].status, ScanStatus::Exhausted);
    assert_eq!(invocations[0].len(), 3);
}

/// Filtered-out rows still count toward the per-invocation threshold.
#[test]
fn test_threshold_counts_candidates() {
    let (table, index) = table_of(&[1, 2, 3, 4]);
    let plan = from(1)
        .with_predicate(Expression::compare(
            CompareOp::Ge,
            Expression::column(0),
            Expression::constant(4),
        ))
        .with_suspension(Some(2));
    let invocations = run_all(plan, &table, &index, &[]);

    assert_eq!(invocations.len(), 2);
    assert!(invocations[0].is_empty());
    assert_eq!(invocations[0].stats.rows_scanned, 2);
    assert_eq!(positions(&invocations[1].rows), vec![3]);
}

/// The fragment seam reports suspendability.
#[test]
fn test_fragment_suspendable_flag() {
    let (table, index) = table_of(&[1]);
    let config = ScanConfig::default();
    let plain = IndexScanExecutor::new(from(1), &index, &table, &config).unwrap();
    let suspending =
        IndexScanExecutor::new(from(1).with_suspension(Some(5)), &index, &table, &config).unwrap();

    let fragments: [&dyn FragmentExecutor; 2] = [&plain, &suspending];
    assert!(!fragments[0].is_suspendable());
    assert!(fragments[1].is_suspendable());
}

// =============================================================================
// Offset and Limit
// =============================================================================

/// The limit is global: it is not reset when an invocation resumes.
#[test]
fn test_limit_spans_invocations() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1)
        .with_limit(LimitSpec::new(Some(3), 0))
        .with_suspension(Some(2));
    let invocations = run_all(plan, &table, &index, &[]);

    assert_eq!(invocations.len(), 2);
    assert_eq!(positions(&invocations[0].rows), vec![0, 1]);
    assert_eq!(invocations[1].status, ScanStatus::LimitReached);
    assert_eq!(positions(&invocations[1].rows), vec![2]);
}

/// Reaching the limit at a threshold boundary ends the scan without suspending.
#[test]
fn test_limit_on_threshold_boundary() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1)
        .with_limit(LimitSpec::new(Some(2), 0))
        .with_suspension(Some(2));
    let invocations = run_all(plan, &table, &index, &[]);
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].status, ScanStatus::LimitReached);
}

/// Offset skips rows before the limit counts.
#[test]
fn test_offset_then_limit() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1).with_limit(LimitSpec::new(Some(2), 1));
    let invocations = run_all(plan, &table, &index, &[]);
    assert_eq!(positions(&invocations[0].rows), vec![1, 2]);
    assert_eq!(invocations[0].stats.rows_skipped_by_offset, 1);
}

/// Limit and offset parameters are read once, when the scan starts.
#[test]
fn test_parameterized_limit_fixed_across_resumes() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1)
        .with_limit(LimitSpec {
            limit_param: Some(0),
            offset_param: Some(1),
            ..LimitSpec::default()
        })
        .with_suspension(Some(1));
    let mut exec = IndexScanExecutor::new(plan, &index, &table, &ScanConfig::default()).unwrap();

    let first = exec.execute(&[Value::Integer(2), Value::Integer(1)]).unwrap();
    assert_eq!(first.status, ScanStatus::Suspended);
    assert!(first.is_empty());

    let resumed = [Value::Integer(100), Value::Integer(0)];
    let second = exec.execute(&resumed).unwrap();
    let third = exec.execute(&resumed).unwrap();
    assert_eq!(positions(&second.rows), vec![1]);
    assert_eq!(positions(&third.rows), vec![2]);
    assert_eq!(third.status, ScanStatus::LimitReached);
}

/// A negative limit parameter fails the invocation.
#[test]
fn test_negative_limit_param_fails() {
    let (table, index) = table_of(&[1]);
    let plan = from(1).with_limit(LimitSpec {
        limit_param: Some(0),
        ..LimitSpec::default()
    });
    let mut exec = IndexScanExecutor::new(plan, &index, &table, &ScanConfig::default()).unwrap();
    assert!(exec.execute(&[Value::Integer(-1)]).is_err());
    assert_eq!(exec.phase(), ScanPhase::Idle);
}

// =============================================================================
// Inline Aggregation
// =============================================================================

/// Aggregated rows appear only when the scan ends.
#[test]
fn test_aggregate_only_on_terminal_invocation() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1)
        .with_aggregate(AggregateSpec {
            group_by: vec![],
            calls: vec![AggregateCall::CountStar, AggregateCall::Sum { column: 0 }],
        })
        .with_suspension(Some(1));
    let invocations = run_all(plan, &table, &index, &[]);

    assert_eq!(invocations.len(), 4);
    for suspended in &invocations[..3] {
        assert!(suspended.is_empty());
        assert_eq!(suspended.stats.rows_emitted, 1);
    }
    let last = &invocations[3];
    assert_eq!(last.status, ScanStatus::Exhausted);
    assert_eq!(last.rows, vec![Row::new(vec![Value::Integer(4), Value::Integer(7)])]);
}

/// Grouped aggregation honours the limit on its input.
#[test]
fn test_grouped_aggregate_with_limit() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1)
        .with_direction(SortDirection::Desc)
        .with_limit(LimitSpec::new(Some(3), 0))
        .with_aggregate(AggregateSpec {
            group_by: vec![0],
            calls: vec![AggregateCall::CountStar],
        });
    let invocations = run_all(plan, &table, &index, &[]);
    assert_eq!(
        concat(&invocations),
        vec![
            Row::new(vec![Value::Integer(1), Value::Integer(1)]),
            Row::new(vec![Value::Integer(2), Value::Integer(1)]),
            Row::new(vec![Value::Integer(3), Value::Integer(1)]),
        ]
    );
}

/// Keeps only the last row it was given
#[derive(Default)]
struct LastRow {
    last: Option<Row>,
}

impl InlineAggregator for LastRow {
    fn push(&mut self, row: &Row) -> ExecutorResult<()> {
        self.last = Some(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> ExecutorResult<Vec<Row>> {
        Ok(self.last.take().into_iter().collect())
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// A caller-supplied aggregator sees every emitted row across resumes.
#[test]
fn test_custom_aggregator_spans_invocations() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = from(1).with_suspension(Some(1));
    let mut exec = IndexScanExecutor::new(plan, &index, &table, &ScanConfig::default())
        .unwrap()
        .with_aggregator(Box::new(LastRow::default()));
    let invocations = run_to_completion(&mut exec, &[]).unwrap();

    assert_eq!(invocations.len(), 4);
    assert!(invocations[..3].iter().all(InvocationResult::is_empty));
    assert_eq!(positions(&concat(&invocations)), vec![3]);
}

// =============================================================================
// Cancel
// =============================================================================

/// Cancel after a suspension; the next call starts a fresh scan.
#[test]
fn test_cancel_restarts_scan() {
    let (table, index) = table_of(&[1, 1, 2, 3]);
    let plan = IndexScanPlanNode::new("t", "idx_a", LookupType::GreaterEqual)
        .with_search_keys(vec![Expression::param(0)])
        .with_suspension(Some(2));
    let mut exec = IndexScanExecutor::new(plan, &index, &table, &ScanConfig::default()).unwrap();

    let first = exec.execute(&[Value::Integer(1)]).unwrap();
    assert!(first.has_more());
    FragmentExecutor::cancel(&mut exec);

    let fresh = run_to_completion(&mut exec, &[Value::Integer(2)]).unwrap();
    assert_eq!(positions(&concat(&fresh)), vec![2, 3]);
    assert_eq!(exec.metrics().snapshot().cancellations, 1);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Any positive threshold yields the unsuspended output, split into
    /// invocations that each take exactly `threshold` candidates.
    #[test]
    fn prop_suspension_is_transparent(
        values in prop::collection::vec(0i64..8, 0..40),
        key in 0i64..8,
        threshold in 1i64..10,
        limit in prop::option::of(0i64..20),
        offset in 0i64..6,
        descending in any::<bool>(),
    ) {
        let (table, index) = table_of(&values);
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        let base = from(key)
            .with_direction(direction)
            .with_limit(LimitSpec::new(limit, offset));

        let whole = run_all(base.clone(), &table, &index, &[]);
        prop_assert_eq!(whole.len(), 1);

        let split = run_all(base.with_suspension(Some(threshold)), &table, &index, &[]);
        prop_assert_eq!(concat(&split), concat(&whole));
        prop_assert_eq!(split[split.len() - 1].status, whole[0].status);
        for invocation in &split[..split.len() - 1] {
            prop_assert_eq!(invocation.status, ScanStatus::Suspended);
            prop_assert_eq!(invocation.stats.rows_scanned, threshold as u64);
        }
    }

    /// Transparency holds for every lookup type on a composite index, with
    /// one or two key slots and range end keys.
    #[test]
    fn prop_suspension_is_transparent_for_all_lookups(
        pairs in prop::collection::vec((0i64..4, 0i64..4), 0..30),
        lookup in lookup_strategy(),
        start in (0i64..4, 0i64..4),
        end in (0i64..4, 0i64..4),
        two_slots in any::<bool>(),
        end_inclusive in any::<bool>(),
        threshold in 1i64..6,
        descending in any::<bool>(),
    ) {
        let (table, index) = composite_table_of(&pairs);
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        let slots = |(a, b): (i64, i64)| {
            if two_slots {
                vec![Expression::constant(a), Expression::constant(b)]
            } else {
                vec![Expression::constant(a)]
            }
        };

        let mut base = IndexScanPlanNode::new("t", "idx_ab", lookup)
            .with_search_keys(slots(start))
            .with_direction(direction);
        if lookup == LookupType::Range {
            base = base.with_end_keys(slots(end), end_inclusive);
        }

        let whole = run_all(base.clone(), &table, &index, &[]);
        prop_assert_eq!(whole.len(), 1);

        let split = run_all(base.with_suspension(Some(threshold)), &table, &index, &[]);
        prop_assert_eq!(positions_at(&concat(&split), 2), positions_at(&concat(&whole), 2));
        prop_assert_eq!(split[split.len() - 1].status, whole[0].status);
        for invocation in &split[..split.len() - 1] {
            prop_assert_eq!(invocation.status, ScanStatus::Suspended);
            prop_assert_eq!(invocation.stats.rows_scanned, threshold as u64);
        }
    }

    /// Emitted rows number max(0, min(limit, matching - offset)).
    #[test]
    fn prop_offset_limit_count(
        values in prop::collection::vec(0i64..8, 0..40),
        key in 0i64..8,
        limit in 0i64..20,
        offset in 0i64..20,
    ) {
        let (table, index) = table_of(&values);
        let matching = values.iter().filter(|v| **v >= key).count() as i64;
        let expected = limit.min((matching - offset).max(0));

        let result = run_all(from(key).with_limit(LimitSpec::new(Some(limit), offset)), &table, &index, &[]);
        prop_assert_eq!(concat(&result).len() as i64, expected);
    }

    /// Rows come out in index order, ties broken by insertion position.
    #[test]
    fn prop_full_scan_is_sorted(values in prop::collection::vec(-5i64..5, 0..30)) {
        let (table, index) = table_of(&values);
        let plan = IndexScanPlanNode::new("t", "idx_a", LookupType::Equal);
        let rows = concat(&run_all(plan, &table, &index, &[]));

        let mut expected: Vec<(i64, i64)> =
            values.iter().enumerate().map(|(pos, a)| (*a, pos as i64)).collect();
        expected.sort();
        let actual: Vec<(i64, i64)> = rows
            .iter()
            .filter_map(|r| Some((r.get(0)?.as_i64()?, r.get(1)?.as_i64()?)))
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
