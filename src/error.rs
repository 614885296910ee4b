//! Error types for the surveykit engine.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`AnswerError`] - Per-question answer validation failures
//! - [`DefinitionError`] - Survey definition (authoring/import) failures
//! - [`StoreError`] - Storage layer errors
//! - [`SubmitError`] - Submission/draft orchestration errors
//! - [`ExportError`] - Export errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. The one deliberate
//! exception is `StoreError -> SubmitError`: storage constraint
//! violations surface as [`SubmitError::Conflict`] so callers can show
//! "already submitted" messaging instead of a generic failure.

use thiserror::Error;

use crate::validation::ValidationIssue;

// =============================================================================
// Answer Validation Errors
// =============================================================================

/// Errors produced while validating one answer against one question.
///
/// Every variant carries the question label for user-facing messaging.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnswerError {
    /// Value is not numeric.
    #[error("'{label}' must be a number")]
    NotNumeric { label: String },

    /// Numeric value below the configured minimum.
    #[error("'{label}' must be at least {min}")]
    BelowMinimum { label: String, min: f64 },

    /// Numeric value above the configured maximum.
    #[error("'{label}' must be at most {max}")]
    AboveMaximum { label: String, max: f64 },

    /// Value is not a string.
    #[error("'{label}' must be text")]
    NotText { label: String },

    /// String shorter than the configured minimum length.
    #[error("'{label}' must be at least {min} characters")]
    TooShort { label: String, min: usize },

    /// String longer than the configured maximum length.
    #[error("'{label}' must be at most {max} characters")]
    TooLong { label: String, max: usize },

    /// String does not match the configured pattern.
    #[error("'{label}' does not match the expected format")]
    PatternMismatch { label: String },

    /// The configured pattern itself failed to compile.
    #[error("'{label}' has an invalid validation pattern: {pattern}")]
    InvalidPattern { label: String, pattern: String },

    /// Value is not one of the question's options.
    #[error("Invalid option '{value}' for '{label}'")]
    InvalidOption { label: String, value: String },

    /// Checkbox answer is not an array of strings.
    #[error("'{label}' must be a list of options")]
    NotACollection { label: String },

    /// Date answer does not parse.
    #[error("'{label}' must be a valid date")]
    InvalidDate { label: String },

    /// Time answer does not parse.
    #[error("'{label}' must be a valid time")]
    InvalidTime { label: String },

    /// Location answer is missing latitude or longitude.
    #[error("'{label}' must carry latitude and longitude")]
    MissingCoordinates { label: String },
}

// =============================================================================
// Survey Definition Errors
// =============================================================================

/// Errors raised while importing or checking a survey definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// JSON Schema validation of the definition failed.
    #[error("Definition failed schema validation: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// A logic condition references a question that does not exist.
    #[error("Question '{question}' logic references unknown question '{reference}'")]
    UnknownReference { question: String, reference: String },

    /// A logic condition references its own question.
    #[error("Question '{0}' logic references itself")]
    SelfReference(String),

    /// The logic conditions form a dependency cycle.
    #[error("Conditional logic cycle involving question '{0}'")]
    LogicCycle(String),

    /// The definition file could not be parsed.
    #[error("Invalid definition JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error reading the definition file.
    #[error("Failed to read definition: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from the SQLite storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored JSON column failed to (de)serialize.
    #[error("Stored JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (database file handling).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No free slug could be allocated for the title.
    #[error("No available slug for title '{0}'")]
    SlugExhausted(String),
}

impl StoreError {
    /// Whether this error is a storage-level uniqueness violation.
    ///
    /// The unique index on `responses.submission_key` is the real guard
    /// against concurrent duplicate submissions; the coordinator's
    /// existence pre-check is only an optimization.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

// =============================================================================
// Submission Errors (top-level)
// =============================================================================

/// Top-level errors from the submission coordinator.
///
/// This is the main error type returned by
/// [`crate::submission::SubmissionCoordinator`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Survey, response, or draft not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Survey is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),

    /// Submission is outside the survey's start/end window.
    #[error("{0}")]
    OutOfWindow(String),

    /// Duplicate submission, or delete blocked by existing responses.
    #[error("{0}")]
    Conflict(String),

    /// One or more answers failed validation. Carries the full issue list.
    #[error("Validation failed with {} issue(s)", .0.len())]
    ValidationFailed(Vec<ValidationIssue>),

    /// Underlying storage failure.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        if err.is_constraint_violation() {
            SubmitError::Conflict(
                "A submitted response already exists for this survey and user".to_string(),
            )
        } else {
            SubmitError::Store(err)
        }
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors from the export engine.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Survey not found.
    #[error("Survey not found: {0}")]
    NotFound(String),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error flushing the CSV buffer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying storage failure.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for answer validation.
pub type AnswerResult<T> = Result<T, AnswerError>;

/// Result type for definition checks.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for submission operations.
pub type SubmitResult<T> = Result<T, SubmitError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_error_carries_label() {
        let err = AnswerError::AboveMaximum {
            label: "Age".into(),
            max: 10.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Age"));
        assert!(msg.contains("must be at most 10"));
    }

    #[test]
    fn test_constraint_violation_maps_to_conflict() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: responses.submission_key".into()),
        );
        let store_err: StoreError = sqlite_err.into();
        assert!(store_err.is_constraint_violation());

        let submit_err: SubmitError = store_err.into();
        assert!(matches!(submit_err, SubmitError::Conflict(_)));
    }

    #[test]
    fn test_plain_store_error_stays_store() {
        let store_err = StoreError::SlugExhausted("my survey".into());
        let submit_err: SubmitError = store_err.into();
        assert!(matches!(submit_err, SubmitError::Store(_)));
    }
}
