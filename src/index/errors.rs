//! Index error types
//!
//! Error codes:
//! - AERO_INDEX_BUILD_FAILED (FATAL)
//! - AERO_INDEX_KEY_INVALID (ERROR)

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation rejected, index unchanged
    Error,
    /// Index cannot be used
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Index definition or initial population failed
    AeroIndexBuildFailed,
    /// A row's key does not fit the index key schema
    AeroIndexKeyInvalid,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::AeroIndexBuildFailed => "AERO_INDEX_BUILD_FAILED",
            IndexErrorCode::AeroIndexKeyInvalid => "AERO_INDEX_KEY_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            IndexErrorCode::AeroIndexBuildFailed => Severity::Fatal,
            IndexErrorCode::AeroIndexKeyInvalid => Severity::Error,
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone)]
pub struct IndexError {
    /// Error code
    code: IndexErrorCode,
    /// Human-readable message
    message: String,
    /// Index name
    index: String,
}

impl IndexError {
    /// Create an index build failed error
    pub fn build_failed(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::AeroIndexBuildFailed,
            message: reason.into(),
            index: index.into(),
        }
    }

    /// Create an invalid key error
    pub fn key_invalid(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::AeroIndexKeyInvalid,
            message: reason.into(),
            index: index.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
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

    /// Returns the index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: index '{}': {}",
            self.code.severity(),
            self.code.code(),
            self.index,
            self.message
        )
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
