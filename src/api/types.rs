//! REST API types for response collection.
//!
//! Request bodies mirror the public contract:
//! `{ answers: [{questionId, answer, files?}], metadata? }`, plus an
//! optional `responseId` on draft saves. Error payloads carry the full
//! validation issue list so clients can show every problem at once.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ExportError, SubmitError};
use crate::models::{
    Answer, AnswerInput, ResponseMetadata, Survey, SurveyResponse,
};

/// Body of `POST /surveys/{id}/responses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
    #[serde(default)]
    pub metadata: Option<ResponseMetadata>,
}

/// Body of `POST /surveys/{id}/responses/draft`. `responseId` names an
/// existing draft to replace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftBody {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
    #[serde(default)]
    pub metadata: Option<ResponseMetadata>,
    #[serde(default)]
    pub response_id: Option<String>,
}

/// One answer in a response payload, optionally enriched with question
/// metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<&'static str>,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Value>,
}

/// A persisted response as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub id: String,
    pub uuid: String,
    pub survey_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    pub metadata: ResponseMetadata,
    pub answers: Vec<AnswerPayload>,
}

impl ResponsePayload {
    /// Plain projection, without question metadata.
    pub fn from_response(response: SurveyResponse) -> Self {
        Self::build(response, None)
    }

    /// Projection with each answer's question label and type attached.
    pub fn with_questions(response: SurveyResponse, survey: &Survey) -> Self {
        Self::build(response, Some(survey))
    }

    fn build(response: SurveyResponse, survey: Option<&Survey>) -> Self {
        let answers = response
            .answers
            .iter()
            .map(|answer| answer_payload(answer, survey))
            .collect();
        Self {
            id: response.id,
            uuid: response.uuid,
            survey_id: response.survey_id,
            user_id: response.user_id,
            status: response.status.as_str().to_string(),
            submitted_at: response.submitted_at.map(|t| t.to_rfc3339()),
            metadata: response.metadata,
            answers,
        }
    }
}

fn answer_payload(answer: &Answer, survey: Option<&Survey>) -> AnswerPayload {
    let question = survey.and_then(|s| s.question(&answer.question_id));
    AnswerPayload {
        question_id: answer.question_id.clone(),
        label: question.map(|q| q.label.clone()),
        question_type: question.map(|q| q.question_type.as_str()),
        value: serde_json::to_value(&answer.value).unwrap_or(Value::Null),
        files: answer
            .files
            .as_ref()
            .map(|f| serde_json::to_value(f).unwrap_or(Value::Null)),
    }
}

/// Create a plain error body.
pub fn error_response(error: &str) -> Value {
    json!({ "error": error })
}

/// Map a submission error to its HTTP status and body. Validation
/// failures embed the full per-question issue list.
pub fn submit_error_response(err: SubmitError) -> (StatusCode, Json<Value>) {
    match err {
        SubmitError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(error_response(&msg))),
        SubmitError::Conflict(msg) => (StatusCode::CONFLICT, Json(error_response(&msg))),
        SubmitError::InvalidState(msg) | SubmitError::OutOfWindow(msg) => {
            (StatusCode::BAD_REQUEST, Json(error_response(&msg)))
        }
        SubmitError::ValidationFailed(issues) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Validation failed",
                "issues": issues,
            })),
        ),
        SubmitError::Store(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&err.to_string())),
        ),
    }
}

/// Map an export error to its HTTP status and body.
pub fn export_error_response(err: ExportError) -> (StatusCode, Json<Value>) {
    match err {
        ExportError::NotFound(reference) => (
            StatusCode::NOT_FOUND,
            Json(error_response(&format!("Survey not found: {reference}"))),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&other.to_string())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationIssue;

    #[test]
    fn test_submit_body_defaults() {
        let body: SubmitBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.answers.is_empty());
        assert!(body.metadata.is_none());

        let body: SubmitBody = serde_json::from_value(json!({
            "answers": [{ "questionId": "q1", "answer": 7 }],
            "metadata": { "userAgent": "test" }
        }))
        .unwrap();
        assert_eq!(body.answers.len(), 1);
        assert_eq!(body.metadata.unwrap().user_agent.as_deref(), Some("test"));
    }

    #[test]
    fn test_validation_failure_lists_issues() {
        let err = SubmitError::ValidationFailed(vec![ValidationIssue {
            question_id: "q1".into(),
            label: "Age".into(),
            message: "'Age' must be at most 10".into(),
        }]);
        let (status, Json(body)) = submit_error_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["issues"][0]["questionId"], "q1");
        assert!(body["issues"][0]["message"]
            .as_str()
            .unwrap()
            .contains("at most 10"));
    }

    #[test]
    fn test_status_mapping() {
        let (status, _) = submit_error_response(SubmitError::NotFound("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = submit_error_response(SubmitError::Conflict("x".into()));
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = submit_error_response(SubmitError::OutOfWindow("x".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
