//! Index scan executor subsystem
//!
//! Runs an index-scan plan node against a table and one of its indexes and
//! produces rows in index order.
//!
//! # Execution Flow
//!
//! 1. Evaluate search keys and end keys (once per logical scan)
//! 2. Position the index cursor
//! 3. Walk the cursor one candidate at a time
//! 4. Fetch the row; skip pending deletes
//! 5. Apply skip-null, end expression and predicate
//! 6. Project, apply offset and limit, feed the inline aggregator
//! 7. Yield when the suspension threshold is hit
//!
//! A suspended scan resumes exactly where it stopped; the concatenation of
//! all invocations equals the output of a single unsuspended run.

mod aggregate;
mod config;
mod errors;
mod fragment;
mod index_scan;
mod pipeline;
mod postfilter;
mod projection;
mod result;
mod search_key;
mod suspension;
mod walker;

pub use aggregate::{InlineAggregator, SerialAggregator};
pub use config::ScanConfig;
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use fragment::{run_to_completion, FragmentExecutor};
pub use index_scan::{IndexScanExecutor, ScanPhase};
pub use pipeline::{OutputPipeline, RowFate};
pub use postfilter::CountingPostfilter;
pub use projection::Projector;
pub use result::{InvocationResult, InvocationStats, ScanStatus};
pub use search_key::{KeyOutcome, ResolvedLookup, SearchKeyBuilder};
pub use suspension::SuspensionController;
pub use walker::IndexCursorWalker;
