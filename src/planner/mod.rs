//! Compiled plan nodes consumed by the scan executor
//!
//! Plan compilation and index selection happen elsewhere; this module only
//! defines the index-scan plan node as it is delivered to the executor, and
//! the structural checks that can run without the index or table.
//!
//! # Design Principles
//!
//! - Explicit: every field the executor reads is named in the node
//! - Fail fast: an inconsistent plan is rejected before any scanning

mod errors;
mod plan;

pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use plan::{
    AggregateCall, AggregateSpec, IndexScanPlanNode, LimitSpec, LookupType, ProjectionColumn,
    SortDirection,
};
