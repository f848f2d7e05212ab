//! aeroscan - suspendable index scans for a single-threaded partition engine
//!
//! The executor walks an ordered index from a search key, filters and
//! projects the rows it finds, applies offset and limit inline, and can
//! yield after a bounded number of rows so other work interleaves.

pub mod cli;
pub mod executor;
pub mod expression;
pub mod index;
pub mod observability;
pub mod planner;
pub mod table;
pub mod types;
