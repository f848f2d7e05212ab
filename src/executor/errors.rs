//! Executor error types
//!
//! Error codes:
//! - AERO_PLAN_INVALID (REJECT)
//! - AERO_CONFIG_INVALID (REJECT)
//! - AERO_EXPRESSION_FAILED (ERROR)
//! - AERO_AGGREGATION_FAILED (ERROR)
//!
//! Every error is fatal to the current invocation and discards the scan
//! state; none of them is fatal to the process.

use std::error::Error as StdError;
use std::fmt;

use crate::expression::ExpressionError;
use crate::planner::PlannerError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Rejected at initialization, scanning never began
    Reject,
    /// Invocation failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Plan is inconsistent with itself, the index or the table
    AeroPlanInvalid,
    /// Scan configuration unreadable or out of range
    AeroConfigInvalid,
    /// Expression evaluation failed
    AeroExpressionFailed,
    /// Inline aggregation rejected a row
    AeroAggregationFailed,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::AeroPlanInvalid => "AERO_PLAN_INVALID",
            ExecutorErrorCode::AeroConfigInvalid => "AERO_CONFIG_INVALID",
            ExecutorErrorCode::AeroExpressionFailed => "AERO_EXPRESSION_FAILED",
            ExecutorErrorCode::AeroAggregationFailed => "AERO_AGGREGATION_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::AeroPlanInvalid | ExecutorErrorCode::AeroConfigInvalid => {
                Severity::Reject
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug)]
pub struct ExecutorError {
    /// Error code
    code: ExecutorErrorCode,
    /// Human-readable message
    message: String,
    /// Originating error, if any
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ExecutorError {
    /// Create a plan invalid error
    pub fn plan_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroPlanInvalid,
            message: reason.into(),
            source: None,
        }
    }

    /// Create a config invalid error
    pub fn config_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroConfigInvalid,
            message: reason.into(),
            source: None,
        }
    }

    /// Create an expression failure, naming what was being evaluated
    pub fn expression_failed(context: impl Into<String>, cause: ExpressionError) -> Self {
        Self {
            code: ExecutorErrorCode::AeroExpressionFailed,
            message: format!("{}: {}", context.into(), cause),
            source: Some(Box::new(cause)),
        }
    }

    /// Create an aggregation failure
    pub fn aggregation_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroAggregationFailed,
            message: reason.into(),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether the plan was rejected before scanning
    pub fn is_rejection(&self) -> bool {
        self.severity() == Severity::Reject
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl StdError for ExecutorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<PlannerError> for ExecutorError {
    fn from(err: PlannerError) -> Self {
        Self {
            code: ExecutorErrorCode::AeroPlanInvalid,
            message: err.message().to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
