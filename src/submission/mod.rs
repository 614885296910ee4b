//! Submission orchestration.
//!
//! [`SubmissionCoordinator`] drives the atomic creation/replacement of
//! a response and its answers, enforcing survey-level policy first:
//! published status, start/end window, anonymous access, and the
//! multiple-submission rule.
//!
//! A response is created directly in `submitted` state by [`submit`],
//! or in `draft` state by [`save_draft`]. A draft can be re-saved any
//! number of times (answers replaced wholesale, never merged). Drafts
//! and submissions are independent paths: finalizing a draft happens
//! through a fresh `submit` call, not a status promotion.
//!
//! [`submit`]: SubmissionCoordinator::submit
//! [`save_draft`]: SubmissionCoordinator::save_draft

use chrono::Utc;

use crate::api::logs::{log_success, log_warning};
use crate::error::{SubmitError, SubmitResult};
use crate::models::{
    AnswerInput, ResponseMetadata, ResponseStatus, Survey, SurveyResponse, SurveyStatus,
};
use crate::store::SurveyStore;
use crate::validation::{coerce_answers, validate_response};

/// A submit or draft-save request.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub answers: Vec<AnswerInput>,
    pub metadata: ResponseMetadata,
    /// Supplied by the auth collaborator; absent for anonymous calls.
    pub user_id: Option<String>,
}

/// Orchestrates response persistence against one store.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    store: SurveyStore,
}

impl SubmissionCoordinator {
    pub fn new(store: SurveyStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SurveyStore {
        &self.store
    }

    /// Submit a final response.
    ///
    /// Policy checks run in order: survey exists, survey is published,
    /// anonymous access allowed, submission window open, no prior
    /// submission (when multiples are disallowed). Then the full answer
    /// set is validated; every violation is returned at once. On
    /// success the response and its answers are written in one
    /// transaction and re-read with answers attached.
    pub fn submit(&self, survey_ref: &str, request: SubmitRequest) -> SubmitResult<SurveyResponse> {
        let survey = self.load_survey(survey_ref)?;
        let now = Utc::now();

        if survey.status != SurveyStatus::Published {
            return Err(SubmitError::InvalidState(format!(
                "Survey '{}' is not published",
                survey.title
            )));
        }
        if !survey.settings.allow_anonymous && request.user_id.is_none() {
            return Err(SubmitError::InvalidState(
                "This survey does not accept anonymous responses".to_string(),
            ));
        }
        if let Some(start) = survey.settings.start_date {
            if now < start {
                return Err(SubmitError::OutOfWindow(
                    "Survey has not started yet".to_string(),
                ));
            }
        }
        if let Some(end) = survey.settings.end_date {
            if now > end {
                return Err(SubmitError::OutOfWindow(
                    "Survey has already ended".to_string(),
                ));
            }
        }

        let enforce_single = !survey.settings.allow_multiple_submissions;
        if enforce_single {
            if let Some(user_id) = &request.user_id {
                // Pre-check only; the submission_key constraint is the
                // real guarantee under concurrency.
                if self.store.has_submitted(&survey.id, user_id)? {
                    return Err(SubmitError::Conflict(
                        "You have already submitted a response to this survey".to_string(),
                    ));
                }
            }
        }

        let (validated, issues) = validate_response(&survey, &request.answers);
        if !issues.is_empty() {
            log_warning(format!(
                "Submission to '{}' rejected: {} validation issue(s)",
                survey.slug,
                issues.len()
            ));
            return Err(SubmitError::ValidationFailed(issues));
        }

        let response = SurveyResponse::new_submitted(
            &survey.id,
            request.user_id.clone(),
            request.metadata,
            now,
        );
        self.store
            .insert_response(&response, &validated, enforce_single)?;

        log_success(format!(
            "Response {} submitted to '{}' ({} answer(s))",
            response.uuid,
            survey.slug,
            validated.len()
        ));
        self.reload(&response.uuid)
    }

    /// Save or replace a draft. No required-field or type validation is
    /// enforced; partial completion is expected. When `draft_id` names
    /// an existing draft, its answer set is fully replaced.
    pub fn save_draft(
        &self,
        survey_ref: &str,
        request: SubmitRequest,
        draft_id: Option<&str>,
    ) -> SubmitResult<SurveyResponse> {
        let survey = self.load_survey(survey_ref)?;
        let answers = coerce_answers(&survey, &request.answers);

        let response = match draft_id {
            Some(id) => {
                let existing = self
                    .store
                    .get_response_by_id(id)?
                    .filter(|r| r.survey_id == survey.id && r.status == ResponseStatus::Draft)
                    .ok_or_else(|| SubmitError::NotFound(format!("Draft not found: {id}")))?;
                self.store
                    .replace_draft(&existing.id, &request.metadata, &answers)?;
                existing
            }
            None => {
                let draft = SurveyResponse::new_draft(
                    &survey.id,
                    request.user_id.clone(),
                    request.metadata,
                    Utc::now(),
                );
                self.store.insert_response(&draft, &answers, false)?;
                draft
            }
        };

        log_success(format!(
            "Draft {} saved for '{}' ({} answer(s))",
            response.uuid,
            survey.slug,
            answers.len()
        ));
        self.reload(&response.uuid)
    }

    /// Fetch one response (with answers) by external uuid.
    pub fn fetch_response(&self, uuid: &str) -> SubmitResult<SurveyResponse> {
        self.store
            .get_response_by_uuid(uuid)?
            .ok_or_else(|| SubmitError::NotFound(format!("Response not found: {uuid}")))
    }

    /// Delete a survey. Blocked while any response (draft or submitted)
    /// exists for it.
    pub fn remove_survey(&self, survey_ref: &str) -> SubmitResult<()> {
        let survey = self.load_survey(survey_ref)?;
        let count = self.store.response_count(&survey.id)?;
        if count > 0 {
            return Err(SubmitError::Conflict(format!(
                "Survey '{}' has {} response(s) and cannot be deleted",
                survey.title, count
            )));
        }
        self.store.delete_survey(&survey.id)?;
        log_success(format!("Survey '{}' deleted", survey.slug));
        Ok(())
    }

    fn load_survey(&self, survey_ref: &str) -> SubmitResult<Survey> {
        self.store
            .get_survey(survey_ref)?
            .ok_or_else(|| SubmitError::NotFound(format!("Survey not found: {survey_ref}")))
    }

    fn reload(&self, uuid: &str) -> SubmitResult<SurveyResponse> {
        self.store
            .get_response_by_uuid(uuid)?
            .ok_or_else(|| SubmitError::NotFound(format!("Response not found: {uuid}")))
    }
}
