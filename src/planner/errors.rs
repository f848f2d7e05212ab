//! Plan node error types
//!
//! Error codes:
//! - AERO_PLAN_MALFORMED (REJECT)
//! - AERO_PLAN_INVALID (REJECT)

use std::fmt;

/// Severity levels for plan errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Plan rejected before any scanning
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Plan-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Plan text could not be decoded
    AeroPlanMalformed,
    /// Plan decoded but is inconsistent
    AeroPlanInvalid,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::AeroPlanMalformed => "AERO_PLAN_MALFORMED",
            PlannerErrorCode::AeroPlanInvalid => "AERO_PLAN_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Plan error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// Plan field at fault, if known
    field: Option<String>,
}

impl PlannerError {
    /// Create a malformed plan error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroPlanMalformed,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an invalid plan error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroPlanInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an invalid plan error blaming one field
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroPlanInvalid,
            message: reason.into(),
            field: Some(field.into()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
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

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref field) = self.field {
            write!(f, " (field: {})", field)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlannerError {}

/// Result type for plan operations
pub type PlannerResult<T> = Result<T, PlannerError>;
