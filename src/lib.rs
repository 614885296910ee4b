//! # Surveykit - survey definition, validation, and response collection
//!
//! Surveykit models a survey as an ordered set of typed, conditionally
//! branching questions, validates submitted answers against per-type
//! rules and visibility logic, persists responses atomically, and
//! exports collected responses as CSV or JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐   ┌───────────┐
//! │ Submission │──▶│ Validation │──▶│ Atomic write│──▶│  Response │
//! │  (answers) │   │ (logic +   │   │ (response + │   │ (re-read) │
//! │            │   │  per-type) │   │  answers)   │   │           │
//! └────────────┘   └────────────┘   └─────────────┘   └───────────┘
//!                                          │
//!                                          ▼
//!                                   ┌─────────────┐
//!                                   │   Export    │  CSV / JSON
//!                                   └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use surveykit::{SubmissionCoordinator, SurveyStore, SubmitRequest};
//!
//! let store = SurveyStore::open("surveys.db".as_ref())?;
//! let coordinator = SubmissionCoordinator::new(store);
//! let response = coordinator.submit("customer-feedback", request)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Survey, Question, Response, Answer)
//! - [`logic`] - Conditional-logic evaluation (show/hide/skip)
//! - [`validation`] - Answer validation pipeline and definition checks
//! - [`slug`] - Unique URL-safe slug generation
//! - [`store`] - SQLite persistence with transactional writes
//! - [`submission`] - Submission/draft orchestration and policy
//! - [`export`] - CSV/JSON export of submitted responses
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Evaluation and validation
pub mod logic;
pub mod validation;

// Persistence
pub mod slug;
pub mod store;

// Orchestration
pub mod submission;

// Export
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AnswerError, DefinitionError, ExportError, StoreError, SubmitError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Answer, AnswerInput, AnswerValue, FileDescriptor, LogicAction, LogicClause, LogicCondition,
    LogicOperator, Question, QuestionDefinition, QuestionOption, QuestionType, ResponseMetadata,
    ResponseStatus, Survey, SurveyDefinition, SurveyResponse, SurveySettings, SurveyStatus,
    ValidationRules,
};

// =============================================================================
// Re-exports - Logic & Validation
// =============================================================================

pub use logic::is_applicable;
pub use validation::{
    check_logic_graph, coerce_answers, validate_answer, validate_definition, validate_response,
    ValidatedAnswer, ValidationIssue,
};

// =============================================================================
// Re-exports - Store & Submission
// =============================================================================

pub use store::SurveyStore;
pub use submission::{SubmissionCoordinator, SubmitRequest};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_survey, ExportArtifact, ExportFormat};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
