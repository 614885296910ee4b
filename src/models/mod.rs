//! Domain models for the surveykit engine.
//!
//! This module contains the core data structures used throughout the engine:
//!
//! - [`Survey`] - A container of ordered questions plus participation settings
//! - [`Question`] - One prompt with a type, validation rules, and optional logic
//! - [`LogicClause`] - AND-combined conditions plus a show/hide/skip action
//! - [`SurveyResponse`] - One respondent's answer set, draft or submitted
//! - [`Answer`] / [`AnswerValue`] - One question's typed value within a response
//! - [`SurveyDefinition`] - The id-less authoring shape accepted at import time
//!
//! `AnswerValue` is the only path by which untyped JSON becomes a stored
//! value; raw input is admitted through the answer validator first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// =============================================================================
// Question Types
// =============================================================================

/// The semantic type of a question.
///
/// Determines which validation rules apply and which [`AnswerValue`]
/// variant an answer normalizes to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Number,
    Date,
    Time,
    Select,
    Radio,
    Checkbox,
    File,
    Location,
    Audio,
    Video,
}

impl QuestionType {
    /// Wire/storage name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::File => "file",
            Self::Location => "location",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Single-choice types whose value must match one option.
    pub fn is_single_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Upload types whose value validation is delegated to the upload
    /// collaborator; only the file-descriptor array is persisted here.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::File | Self::Audio | Self::Video)
    }
}

/// One selectable option of a select/radio/checkbox question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub order: i32,
}

/// Per-question validation rules. All fields optional; absent means
/// the rule does not apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_file_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
}

// =============================================================================
// Conditional Logic
// =============================================================================

/// Comparison operator of one logic condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "in")]
    In,
}

/// What a satisfied logic clause does to its owning question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogicAction {
    /// Question is shown (applicable) only when the conditions hold.
    Show,
    /// Question is hidden when the conditions hold.
    Hide,
    /// Question is skipped when the conditions hold; no required-field
    /// error is raised for it.
    Skip,
}

/// One condition over another question's answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogicCondition {
    /// The referenced question. Must belong to the same survey and must
    /// not be the owning question itself.
    pub question_id: String,
    pub operator: LogicOperator,
    pub value: Value,
}

/// A question's conditional-logic clause: AND-combined conditions plus
/// an action. There is no OR combinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogicClause {
    pub conditions: Vec<LogicCondition>,
    pub action: LogicAction,
}

// =============================================================================
// Question
// =============================================================================

/// One question of a survey. Immutable once loaded; the rest of the
/// engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub survey_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Sort key within the survey. Stable sort keeps declaration order
    /// for equal values; strict uniqueness is not required.
    #[serde(default)]
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic: Option<LogicClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub allow_other: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Question {
    /// Option values, empty for non-choice questions.
    pub fn option_values(&self) -> Vec<&str> {
        self.options
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|o| o.value.as_str())
            .collect()
    }

    /// The validation rules, defaulted when absent.
    pub fn rules(&self) -> ValidationRules {
        self.validation.clone().unwrap_or_default()
    }
}

// =============================================================================
// Survey
// =============================================================================

/// Survey lifecycle status. Only `published` surveys accept submissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Published,
    Closed,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Participation settings of a survey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveySettings {
    pub allow_anonymous: bool,
    pub require_auth: bool,
    pub allow_multiple_submissions: bool,
    pub show_progress_bar: bool,
    pub shuffle_questions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            allow_anonymous: true,
            require_auth: false,
            allow_multiple_submissions: false,
            show_progress_bar: true,
            shuffle_questions: false,
            time_limit_minutes: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// A survey: ordered questions plus settings. Slug is globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: SurveySettings,
    pub status: SurveyStatus,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Survey {
    /// Questions sorted by their `order` key. The sort is stable, so
    /// equal keys keep declaration order.
    pub fn questions_in_order(&self) -> Vec<&Question> {
        let mut qs: Vec<&Question> = self.questions.iter().collect();
        qs.sort_by_key(|q| q.order);
        qs
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

// =============================================================================
// Survey Definition (import shape)
// =============================================================================

/// The id-less shape accepted at import time. Ids and the slug are
/// allocated at persistence.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDefinition {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: SurveySettings,
    #[serde(default)]
    pub status: Option<SurveyStatus>,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One question of a [`SurveyDefinition`].
///
/// `id` may be given explicitly so logic conditions can reference it;
/// absent ids are generated at persistence.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default)]
    pub validation: Option<ValidationRules>,
    #[serde(default)]
    pub logic: Option<LogicClause>,
    #[serde(default)]
    pub parent_question_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub allow_other: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Survey {
    /// Materialize a definition into a persistable survey. Ids are
    /// generated (explicit question ids are kept so logic can reference
    /// them), question order defaults to declaration position, and the
    /// slug starts from the slugified title; slug uniqueness is settled
    /// at persistence time.
    pub fn from_definition(def: SurveyDefinition, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4().to_string();
        let questions = def
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| Question {
                id: q.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                survey_id: id.clone(),
                question_type: q.question_type,
                label: q.label,
                description: q.description,
                placeholder: q.placeholder,
                required: q.required,
                order: q.order.unwrap_or(i as i32 + 1),
                options: q.options,
                validation: q.validation,
                logic: q.logic,
                parent_question_id: q.parent_question_id,
                group_id: q.group_id,
                allow_other: q.allow_other,
                metadata: q.metadata,
            })
            .collect();
        Survey {
            slug: crate::slug::slugify(&def.title),
            id,
            title: def.title,
            description: def.description,
            settings: def.settings,
            status: def.status.unwrap_or(SurveyStatus::Draft),
            questions,
            metadata: def.metadata,
            created_at: now,
        }
    }
}

// =============================================================================
// Answers
// =============================================================================

/// A file descriptor produced by the upload collaborator. The engine
/// persists it as given; file bytes are never opened here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub original_name: String,
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub path: String,
}

/// A validated answer value, tagged by the owning question's type.
///
/// Serialized untagged so JSON round-trips to the natural shape:
/// `7`, `"a"`, `["a","b"]`, `{"latitude":..,"longitude":..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Many(Vec<String>),
    Location { latitude: f64, longitude: f64 },
    Files(Vec<FileDescriptor>),
}

impl AnswerValue {
    /// Best-effort conversion from raw JSON, used where validation is
    /// deliberately not enforced (draft saves, upload passthrough).
    /// Falls back to the raw JSON text when no variant fits.
    pub fn from_raw(raw: &Value) -> Self {
        serde_json::from_value(raw.clone())
            .unwrap_or_else(|_| AnswerValue::Text(raw.to_string()))
    }

    /// Flat rendering for CSV cells: arrays join with `", "`, objects
    /// render as their JSON text, numbers drop a trailing `.0`.
    pub fn render(&self) -> String {
        match self {
            AnswerValue::Bool(b) => b.to_string(),
            AnswerValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Many(items) => items.join(", "),
            AnswerValue::Location { .. } | AnswerValue::Files(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

/// One question's value within one response. Unique per
/// (response, question) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default)]
    pub id: i64,
    pub response_id: String,
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AnswerValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileDescriptor>>,
}

/// One raw incoming answer, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: String,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub files: Option<Vec<FileDescriptor>>,
}

// =============================================================================
// Responses
// =============================================================================

/// Response lifecycle status. `draft -> submitted` is one-way; drafts
/// are re-saved wholesale, submitted responses are immutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Draft,
    Submitted,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

/// Client-side context captured with a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Fill duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// One respondent's answer set to a survey.
///
/// `submitted_at` is set if and only if `status` is `submitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: String,
    pub survey_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Externally addressable identifier, unique across all responses.
    pub uuid: String,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub created_at: DateTime<Utc>,
}

impl SurveyResponse {
    /// A new response in `submitted` state, stamped with `now`.
    pub fn new_submitted(
        survey_id: &str,
        user_id: Option<String>,
        metadata: ResponseMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            survey_id: survey_id.to_string(),
            user_id,
            uuid: Uuid::new_v4().to_string(),
            status: ResponseStatus::Submitted,
            submitted_at: Some(now),
            metadata,
            answers: Vec::new(),
            created_at: now,
        }
    }

    /// A new response in `draft` state. `submitted_at` stays unset.
    pub fn new_draft(
        survey_id: &str,
        user_id: Option<String>,
        metadata: ResponseMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            survey_id: survey_id.to_string(),
            user_id,
            uuid: Uuid::new_v4().to_string(),
            status: ResponseStatus::Draft,
            submitted_at: None,
            metadata,
            answers: Vec::new(),
            created_at: now,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_type_wire_names() {
        let q: QuestionType = serde_json::from_value(json!("textarea")).unwrap();
        assert_eq!(q, QuestionType::Textarea);
        assert_eq!(serde_json::to_value(QuestionType::Checkbox).unwrap(), json!("checkbox"));
    }

    #[test]
    fn test_logic_operator_symbols() {
        let op: LogicOperator = serde_json::from_value(json!("!=")).unwrap();
        assert_eq!(op, LogicOperator::NotEq);
        assert_eq!(serde_json::to_value(LogicOperator::Contains).unwrap(), json!("contains"));
    }

    #[test]
    fn test_answer_value_untagged_roundtrip() {
        let cases = vec![
            (json!(7.0), AnswerValue::Number(7.0)),
            (json!("seven"), AnswerValue::Text("seven".into())),
            (json!(true), AnswerValue::Bool(true)),
            (json!(["a", "b"]), AnswerValue::Many(vec!["a".into(), "b".into()])),
            (
                json!({"latitude": 48.85, "longitude": 2.35}),
                AnswerValue::Location { latitude: 48.85, longitude: 2.35 },
            ),
        ];
        for (raw, expected) in cases {
            let parsed: AnswerValue = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
        }
    }

    #[test]
    fn test_answer_value_render() {
        assert_eq!(AnswerValue::Number(7.0).render(), "7");
        assert_eq!(AnswerValue::Number(2.5).render(), "2.5");
        assert_eq!(
            AnswerValue::Many(vec!["a".into(), "b".into()]).render(),
            "a, b"
        );
        let loc = AnswerValue::Location { latitude: 1.0, longitude: 2.0 };
        assert!(loc.render().contains("latitude"));
    }

    #[test]
    fn test_from_raw_falls_back_to_text() {
        let odd = json!({"nested": {"deep": [1, 2]}});
        let value = AnswerValue::from_raw(&odd);
        assert!(matches!(value, AnswerValue::Text(_)));
    }

    #[test]
    fn test_questions_in_order_is_stable() {
        let mk = |id: &str, order: i32| Question {
            id: id.into(),
            survey_id: "s1".into(),
            question_type: QuestionType::Text,
            label: id.into(),
            description: None,
            placeholder: None,
            required: false,
            order,
            options: None,
            validation: None,
            logic: None,
            parent_question_id: None,
            group_id: None,
            allow_other: false,
            metadata: Map::new(),
        };
        let survey = Survey {
            id: "s1".into(),
            title: "t".into(),
            slug: "t".into(),
            description: None,
            settings: SurveySettings::default(),
            status: SurveyStatus::Published,
            questions: vec![mk("b", 2), mk("a", 1), mk("c", 2)],
            metadata: Map::new(),
            created_at: Utc::now(),
        };
        let ordered: Vec<&str> = survey.questions_in_order().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_settings_default_and_camel_case() {
        let settings: SurveySettings = serde_json::from_value(json!({
            "allowMultipleSubmissions": true
        }))
        .unwrap();
        assert!(settings.allow_multiple_submissions);
        assert!(settings.allow_anonymous);
        assert!(settings.start_date.is_none());
    }

    #[test]
    fn test_submitted_at_set_only_when_submitted() {
        let now = Utc::now();
        let submitted =
            SurveyResponse::new_submitted("s1", None, ResponseMetadata::default(), now);
        assert_eq!(submitted.status, ResponseStatus::Submitted);
        assert_eq!(submitted.submitted_at, Some(now));

        let draft = SurveyResponse::new_draft("s1", None, ResponseMetadata::default(), now);
        assert_eq!(draft.status, ResponseStatus::Draft);
        assert!(draft.submitted_at.is_none());
    }
}
