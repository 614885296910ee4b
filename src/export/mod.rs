//! Export of collected responses.
//!
//! Projects a survey's submitted responses plus question metadata into
//! a row-oriented (CSV) or nested (JSON) artifact. Drafts are never
//! exported. The artifact is built fully in memory; no partial export
//! is ever returned.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::{ExportError, ExportResult};
use crate::models::{Answer, Survey, SurveyResponse};
use crate::store::SurveyStore;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A complete export artifact.
#[derive(Debug, Clone)]
pub enum ExportArtifact {
    Csv { filename: String, content: String },
    Json(Value),
}

/// Load a survey (by id or slug) and export its submitted responses.
pub fn export_survey(
    store: &SurveyStore,
    reference: &str,
    format: ExportFormat,
) -> ExportResult<ExportArtifact> {
    let survey = store
        .get_survey(reference)?
        .ok_or_else(|| ExportError::NotFound(reference.to_string()))?;
    let responses = store.submitted_responses(&survey.id)?;

    match format {
        ExportFormat::Json => Ok(ExportArtifact::Json(to_json(&survey, &responses))),
        ExportFormat::Csv => Ok(ExportArtifact::Csv {
            filename: format!("{}-responses.csv", survey.slug),
            content: to_csv(&survey, &responses)?,
        }),
    }
}

/// Nested JSON projection:
/// `{ survey: {id, title, questions}, responses: [{id, uuid, userId,
/// submittedAt, answers: {questionId -> value}}] }`.
pub fn to_json(survey: &Survey, responses: &[SurveyResponse]) -> Value {
    let questions: Vec<Value> = survey
        .questions_in_order()
        .iter()
        .map(|q| {
            json!({
                "id": q.id,
                "label": q.label,
                "type": q.question_type.as_str(),
            })
        })
        .collect();

    let responses: Vec<Value> = responses
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "uuid": r.uuid,
                "userId": r.user_id,
                "submittedAt": r.submitted_at,
                "answers": answers_map(r),
            })
        })
        .collect();

    json!({
        "survey": {
            "id": survey.id,
            "title": survey.title,
            "questions": questions,
        },
        "responses": responses,
    })
}

/// Row-oriented CSV projection: `Response ID`, `User ID`,
/// `Submitted At`, then one column per question label in survey order.
/// Missing answers render empty, arrays join with `", "`, objects
/// render as their JSON text.
pub fn to_csv(survey: &Survey, responses: &[SurveyResponse]) -> ExportResult<String> {
    let questions = survey.questions_in_order();
    let mut buf = Vec::new();
    {
        let mut wtr = csv::Writer::from_writer(&mut buf);

        let mut header: Vec<String> = vec![
            "Response ID".to_string(),
            "User ID".to_string(),
            "Submitted At".to_string(),
        ];
        header.extend(questions.iter().map(|q| q.label.clone()));
        wtr.write_record(&header)?;

        for response in responses {
            let by_question: HashMap<&str, &Answer> = response
                .answers
                .iter()
                .map(|a| (a.question_id.as_str(), a))
                .collect();

            let mut record: Vec<String> = vec![
                response.uuid.clone(),
                response.user_id.clone().unwrap_or_default(),
                response
                    .submitted_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
            ];
            for question in &questions {
                let cell = by_question
                    .get(question.id.as_str())
                    .map(|a| render_cell(a))
                    .unwrap_or_default();
                record.push(cell);
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// The answer keyed by question id. Upload answers without a value
/// expose their file-descriptor array.
fn answers_map(response: &SurveyResponse) -> Value {
    let mut map = serde_json::Map::new();
    for answer in &response.answers {
        let value = match (&answer.value, &answer.files) {
            (Some(v), _) => serde_json::to_value(v).unwrap_or(Value::Null),
            (None, Some(files)) => serde_json::to_value(files).unwrap_or(Value::Null),
            (None, None) => Value::Null,
        };
        map.insert(answer.question_id.clone(), value);
    }
    Value::Object(map)
}

fn render_cell(answer: &Answer) -> String {
    match (&answer.value, &answer.files) {
        (Some(v), _) => v.render(),
        (None, Some(files)) => serde_json::to_string(files).unwrap_or_default(),
        (None, None) => String::new(),
    }
}
