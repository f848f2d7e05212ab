//! Index-scan plan node
//!
//! The plan node is produced by the compiler and arrives as JSON. It names
//! the index, the lookup type and direction, the expressions that bound the
//! scan, and the inline operators (projection, limit, aggregation) folded
//! into the scan.

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::index::ScanDirection;

use super::errors::{PlannerError, PlannerResult};

/// How the search key positions the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupType {
    Equal,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    /// Lower bound from the search key, upper bound from the end key
    Range,
    /// Entries whose cell covers the search key
    GeoContains,
}

impl LookupType {
    /// Lookups that walk a duplicate chain rather than a direction
    pub fn is_equality_style(&self) -> bool {
        matches!(self, LookupType::Equal | LookupType::GeoContains)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupType::Equal => "eq",
            LookupType::Greater => "gt",
            LookupType::GreaterEqual => "gte",
            LookupType::Less => "lt",
            LookupType::LessEqual => "lte",
            LookupType::Range => "range",
            LookupType::GeoContains => "geo_contains",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Direction the index cursor walks
    pub fn scan_direction(&self) -> ScanDirection {
        match self {
            SortDirection::Asc => ScanDirection::Forward,
            SortDirection::Desc => ScanDirection::Reverse,
        }
    }
}

/// One output column of an inline projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionColumn {
    /// Copy an input column
    Column { index: usize },
    /// Compute a value from the input row
    Expression { expr: Expression },
    /// Copy every input column in order
    AllColumns,
}

/// Inline offset/limit.
///
/// Each of `limit` and `offset` is either a constant or taken from a
/// parameter. A missing limit means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSpec {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit_param: Option<usize>,
    #[serde(default)]
    pub offset_param: Option<usize>,
}

impl LimitSpec {
    pub fn new(limit: Option<i64>, offset: i64) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }
}

/// Aggregate function over a projected column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "func", rename_all = "snake_case")]
pub enum AggregateCall {
    CountStar,
    Count { column: usize },
    Sum { column: usize },
    Min { column: usize },
    Max { column: usize },
}

impl AggregateCall {
    /// Input column read by the call, if any
    pub fn column(&self) -> Option<usize> {
        match self {
            AggregateCall::CountStar => None,
            AggregateCall::Count { column }
            | AggregateCall::Sum { column }
            | AggregateCall::Min { column }
            | AggregateCall::Max { column } => Some(*column),
        }
    }
}

/// Inline serial aggregation. Column indexes refer to the projected row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    #[serde(default)]
    pub group_by: Vec<usize>,
    pub calls: Vec<AggregateCall>,
}

impl AggregateSpec {
    /// Highest input column referenced
    pub fn max_column_index(&self) -> Option<usize> {
        self.group_by
            .iter()
            .copied()
            .chain(self.calls.iter().filter_map(|c| c.column()))
            .max()
    }
}

fn default_true() -> bool {
    true
}

/// Compiled index-scan plan node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexScanPlanNode {
    pub target_table: String,
    pub target_index: String,
    pub lookup_type: LookupType,

    #[serde(default)]
    pub sort_direction: SortDirection,

    /// One expression per active key slot, in key order
    #[serde(default)]
    pub search_keys: Vec<Expression>,

    /// Per slot: NULL matches NULL instead of ending the scan.
    /// Empty means false for every slot.
    #[serde(default)]
    pub compare_not_distinct: Vec<bool>,

    /// Upper key of a `Range` lookup
    #[serde(default)]
    pub end_keys: Vec<Expression>,

    #[serde(default = "default_true")]
    pub end_inclusive: bool,

    /// Evaluated per row; the scan ends at the first row where it is not true
    #[serde(default)]
    pub end_expression: Option<Expression>,

    /// Rows where it is not true are skipped
    #[serde(default)]
    pub predicate: Option<Expression>,

    /// Rows where it is true are skipped
    #[serde(default)]
    pub skip_null_predicate: Option<Expression>,

    #[serde(default)]
    pub projection: Option<Vec<ProjectionColumn>>,

    #[serde(default)]
    pub limit: Option<LimitSpec>,

    #[serde(default)]
    pub aggregate: Option<AggregateSpec>,

    /// The compiler proved the scan returns nothing
    #[serde(default)]
    pub empty_scan: bool,

    #[serde(default)]
    pub suspendable: bool,

    /// Candidate rows per invocation before a suspendable scan yields.
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub suspend_threshold: Option<i64>,
}

impl IndexScanPlanNode {
    /// Creates a plan with no keys, filters or inline operators
    pub fn new(
        target_table: impl Into<String>,
        target_index: impl Into<String>,
        lookup_type: LookupType,
    ) -> Self {
        Self {
            target_table: target_table.into(),
            target_index: target_index.into(),
            lookup_type,
            sort_direction: SortDirection::Asc,
            search_keys: Vec::new(),
            compare_not_distinct: Vec::new(),
            end_keys: Vec::new(),
            end_inclusive: true,
            end_expression: None,
            predicate: None,
            skip_null_predicate: None,
            projection: None,
            limit: None,
            aggregate: None,
            empty_scan: false,
            suspendable: false,
            suspend_threshold: None,
        }
    }

    /// Parse a plan from JSON and validate it
    pub fn from_json(text: &str) -> PlannerResult<Self> {
        let plan: Self =
            serde_json::from_str(text).map_err(|e| PlannerError::malformed(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = direction;
        self
    }

    pub fn with_search_keys(mut self, keys: Vec<Expression>) -> Self {
        self.search_keys = keys;
        self
    }

    pub fn with_compare_not_distinct(mut self, flags: Vec<bool>) -> Self {
        self.compare_not_distinct = flags;
        self
    }

    pub fn with_end_keys(mut self, keys: Vec<Expression>, inclusive: bool) -> Self {
        self.end_keys = keys;
        self.end_inclusive = inclusive;
        self
    }

    pub fn with_end_expression(mut self, expr: Expression) -> Self {
        self.end_expression = Some(expr);
        self
    }

    pub fn with_predicate(mut self, expr: Expression) -> Self {
        self.predicate = Some(expr);
        self
    }

    pub fn with_skip_null_predicate(mut self, expr: Expression) -> Self {
        self.skip_null_predicate = Some(expr);
        self
    }

    pub fn with_projection(mut self, columns: Vec<ProjectionColumn>) -> Self {
        self.projection = Some(columns);
        self
    }

    pub fn with_limit(mut self, limit: LimitSpec) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn with_empty_scan(mut self) -> Self {
        self.empty_scan = true;
        self
    }

    pub fn with_suspension(mut self, threshold: Option<i64>) -> Self {
        self.suspendable = true;
        self.suspend_threshold = threshold;
        self
    }

    /// Compare-not-distinct flag for key slot `slot`
    pub fn compare_not_distinct_at(&self, slot: usize) -> bool {
        self.compare_not_distinct.get(slot).copied().unwrap_or(false)
    }

    /// Check the plan for internal consistency.
    ///
    /// Checks that need the index or table schema happen when the executor
    /// is initialized.
    pub fn validate(&self) -> PlannerResult<()> {
        if self.suspendable {
            if let Some(threshold) = self.suspend_threshold {
                if threshold <= 0 {
                    return Err(PlannerError::invalid_field(
                        "suspend_threshold",
                        format!("suspendable scan needs a positive threshold, got {}", threshold),
                    ));
                }
            }
        }

        match (self.lookup_type, self.end_keys.is_empty()) {
            (LookupType::Range, true) => {
                return Err(PlannerError::invalid_field(
                    "end_keys",
                    "range lookup needs end keys",
                ));
            }
            (LookupType::Range, false) => {}
            (other, false) => {
                return Err(PlannerError::invalid_field(
                    "end_keys",
                    format!("end keys are only allowed on range lookups, not {}", other.as_str()),
                ));
            }
            (_, true) => {}
        }

        if self.lookup_type == LookupType::Range && self.search_keys.len() != self.end_keys.len() {
            return Err(PlannerError::invalid_field(
                "end_keys",
                format!(
                    "{} search keys but {} end keys",
                    self.search_keys.len(),
                    self.end_keys.len()
                ),
            ));
        }

        if !self.compare_not_distinct.is_empty()
            && self.compare_not_distinct.len() != self.search_keys.len()
        {
            return Err(PlannerError::invalid_field(
                "compare_not_distinct",
                format!(
                    "{} flags for {} search keys",
                    self.compare_not_distinct.len(),
                    self.search_keys.len()
                ),
            ));
        }

        if self.search_keys.iter().chain(&self.end_keys).any(|e| e.references_columns()) {
            return Err(PlannerError::invalid_field(
                "search_keys",
                "search key expressions cannot read row columns",
            ));
        }

        if let Some(ref limit) = self.limit {
            if limit.limit.map_or(false, |l| l < 0) {
                return Err(PlannerError::invalid_field("limit", "limit is negative"));
            }
            if limit.offset < 0 {
                return Err(PlannerError::invalid_field("limit", "offset is negative"));
            }
        }

        if let Some(ref aggregate) = self.aggregate {
            if aggregate.calls.is_empty() {
                return Err(PlannerError::invalid_field(
                    "aggregate",
                    "inline aggregate has no calls",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let plan = IndexScanPlanNode::from_json(
            r#"{"target_table":"t","target_index":"idx","lookup_type":"greater_equal",
                "search_keys":[{"kind":"parameter","index":0}]}"#,
        )
        .unwrap();
        assert_eq!(plan.sort_direction, SortDirection::Asc);
        assert!(plan.end_inclusive);
        assert!(!plan.suspendable);
        assert_eq!(plan.search_keys, vec![Expression::param(0)]);
        assert!(!plan.compare_not_distinct_at(0));
    }

    #[test]
    fn test_malformed_json() {
        let err = IndexScanPlanNode::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), crate::planner::PlannerErrorCode::AeroPlanMalformed);
    }

    #[test]
    fn test_suspendable_needs_positive_threshold() {
        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Equal).with_suspension(Some(0));
        assert_eq!(plan.validate().unwrap_err().field(), Some("suspend_threshold"));
        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Equal).with_suspension(None);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_range_end_keys_pairing() {
        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Range)
            .with_search_keys(vec![Expression::constant(1)]);
        assert!(plan.validate().is_err());

        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Greater)
            .with_search_keys(vec![Expression::constant(1)])
            .with_end_keys(vec![Expression::constant(5)], true);
        assert!(plan.validate().is_err());

        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Range)
            .with_search_keys(vec![Expression::constant(1)])
            .with_end_keys(vec![Expression::constant(5)], false);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_compare_not_distinct_length() {
        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Equal)
            .with_search_keys(vec![Expression::constant(1), Expression::constant(2)])
            .with_compare_not_distinct(vec![true]);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_search_keys_cannot_read_columns() {
        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Equal)
            .with_search_keys(vec![Expression::column(0)]);
        assert_eq!(plan.validate().unwrap_err().field(), Some("search_keys"));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let plan = IndexScanPlanNode::new("t", "idx", LookupType::Equal)
            .with_limit(LimitSpec::new(Some(-1), 0));
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_direction_mapping() {
        assert_eq!(SortDirection::Asc.scan_direction(), ScanDirection::Forward);
        assert_eq!(SortDirection::Desc.scan_direction(), ScanDirection::Reverse);
        assert!(LookupType::GeoContains.is_equality_style());
        assert!(!LookupType::Range.is_equality_style());
    }

    #[test]
    fn test_aggregate_spec_json() {
        let spec: AggregateSpec = serde_json::from_str(
            r#"{"group_by":[1],"calls":[{"func":"count_star"},{"func":"sum","column":2}]}"#,
        )
        .unwrap();
        assert_eq!(spec.max_column_index(), Some(2));
        assert_eq!(spec.calls[1], AggregateCall::Sum { column: 2 });
    }
}
