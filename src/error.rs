//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for dcleaner.
///
/// - 0: Success (selection cleaned)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to clean (no candidates, nothing selected)
/// - 3: Partial success (some directories could not be scanned or removed)
/// - 130: Aborted (confirmation declined)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the selection was cleaned.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Nothing to clean: no candidates were found or none were selected.
    NothingToClean = 2,
    /// Partial success: completed, but some directories failed.
    PartialSuccess = 3,
    /// Aborted: the user declined the confirmation.
    Aborted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DC000",
            Self::GeneralError => "DC001",
            Self::NothingToClean => "DC002",
            Self::PartialSuccess => "DC003",
            Self::Aborted => "DC130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Underlying causes, outermost first
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
