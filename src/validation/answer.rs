//! Per-question answer validation.
//!
//! [`validate_answer`] checks one raw JSON value against one question's
//! type and validation rules and normalizes it into a typed
//! [`AnswerValue`]. Every failure carries the question's label so the
//! message can be shown to the respondent as-is.

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::Value;

use crate::error::{AnswerError, AnswerResult};
use crate::models::{AnswerValue, Question, QuestionType};

/// Validate `raw` against `question`, returning the normalized value.
///
/// Upload types (`file`/`audio`/`video`) are not value-validated here:
/// byte handling belongs to the upload collaborator, so their value is
/// converted best-effort and persisted as given.
pub fn validate_answer(question: &Question, raw: &Value) -> AnswerResult<AnswerValue> {
    let label = question.label.as_str();
    let rules = question.rules();

    match question.question_type {
        QuestionType::Number => {
            let n = numeric_value(raw).ok_or_else(|| AnswerError::NotNumeric {
                label: label.into(),
            })?;
            if let Some(min) = rules.min {
                if n < min {
                    return Err(AnswerError::BelowMinimum { label: label.into(), min });
                }
            }
            if let Some(max) = rules.max {
                if n > max {
                    return Err(AnswerError::AboveMaximum { label: label.into(), max });
                }
            }
            Ok(AnswerValue::Number(n))
        }

        QuestionType::Text | QuestionType::Textarea => {
            let s = raw.as_str().ok_or_else(|| AnswerError::NotText {
                label: label.into(),
            })?;
            let len = s.chars().count();
            if let Some(min) = rules.min_length {
                if len < min {
                    return Err(AnswerError::TooShort { label: label.into(), min });
                }
            }
            if let Some(max) = rules.max_length {
                if len > max {
                    return Err(AnswerError::TooLong { label: label.into(), max });
                }
            }
            if let Some(pattern) = &rules.pattern {
                let re = Regex::new(pattern).map_err(|_| AnswerError::InvalidPattern {
                    label: label.into(),
                    pattern: pattern.clone(),
                })?;
                if !re.is_match(s) {
                    return Err(AnswerError::PatternMismatch { label: label.into() });
                }
            }
            Ok(AnswerValue::Text(s.to_string()))
        }

        QuestionType::Select | QuestionType::Radio => {
            let s = raw.as_str().ok_or_else(|| AnswerError::NotText {
                label: label.into(),
            })?;
            if !question.allow_other && !question.option_values().contains(&s) {
                return Err(AnswerError::InvalidOption {
                    label: label.into(),
                    value: s.to_string(),
                });
            }
            Ok(AnswerValue::Text(s.to_string()))
        }

        QuestionType::Checkbox => {
            let items = raw.as_array().ok_or_else(|| AnswerError::NotACollection {
                label: label.into(),
            })?;
            let allowed = question.option_values();
            let mut selected = Vec::with_capacity(items.len());
            for item in items {
                let s = item.as_str().ok_or_else(|| AnswerError::NotACollection {
                    label: label.into(),
                })?;
                if !question.allow_other && !allowed.contains(&s) {
                    return Err(AnswerError::InvalidOption {
                        label: label.into(),
                        value: s.to_string(),
                    });
                }
                selected.push(s.to_string());
            }
            Ok(AnswerValue::Many(selected))
        }

        QuestionType::Date => {
            let s = raw.as_str().ok_or_else(|| AnswerError::InvalidDate {
                label: label.into(),
            })?;
            if !parses_as_date(s) {
                return Err(AnswerError::InvalidDate { label: label.into() });
            }
            Ok(AnswerValue::Text(s.to_string()))
        }

        QuestionType::Time => {
            let s = raw.as_str().ok_or_else(|| AnswerError::InvalidTime {
                label: label.into(),
            })?;
            if !parses_as_time(s) {
                return Err(AnswerError::InvalidTime { label: label.into() });
            }
            Ok(AnswerValue::Text(s.to_string()))
        }

        QuestionType::Location => {
            let (lat, lon) = raw
                .as_object()
                .and_then(|obj| {
                    let lat = obj.get("latitude").and_then(Value::as_f64)?;
                    let lon = obj.get("longitude").and_then(Value::as_f64)?;
                    Some((lat, lon))
                })
                .ok_or_else(|| AnswerError::MissingCoordinates { label: label.into() })?;
            Ok(AnswerValue::Location {
                latitude: lat,
                longitude: lon,
            })
        }

        QuestionType::File | QuestionType::Audio | QuestionType::Video => {
            Ok(AnswerValue::from_raw(raw))
        }
    }
}

/// Accept JSON numbers and numeric strings. Form clients routinely
/// serialize number inputs as strings.
fn numeric_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parses_as_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

fn parses_as_time(s: &str) -> bool {
    NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
        || NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionOption, ValidationRules};
    use serde_json::json;

    fn question(question_type: QuestionType) -> Question {
        Question {
            id: "q1".into(),
            survey_id: "s1".into(),
            question_type,
            label: "Sample".into(),
            description: None,
            placeholder: None,
            required: false,
            order: 1,
            options: None,
            validation: None,
            logic: None,
            parent_question_id: None,
            group_id: None,
            allow_other: false,
            metadata: Default::default(),
        }
    }

    fn with_options(mut q: Question, values: &[&str]) -> Question {
        q.options = Some(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| QuestionOption {
                    label: v.to_string(),
                    value: v.to_string(),
                    order: i as i32,
                })
                .collect(),
        );
        q
    }

    #[test]
    fn test_number_bounds_inclusive() {
        let mut q = question(QuestionType::Number);
        q.validation = Some(ValidationRules {
            min: Some(0.0),
            max: Some(10.0),
            ..Default::default()
        });

        assert_eq!(
            validate_answer(&q, &json!(7)).unwrap(),
            AnswerValue::Number(7.0)
        );
        assert_eq!(
            validate_answer(&q, &json!(10)).unwrap(),
            AnswerValue::Number(10.0)
        );
        let err = validate_answer(&q, &json!(15)).unwrap_err();
        assert!(err.to_string().contains("must be at most 10"));
        assert!(matches!(
            validate_answer(&q, &json!(-1)).unwrap_err(),
            AnswerError::BelowMinimum { .. }
        ));
    }

    #[test]
    fn test_number_accepts_numeric_string() {
        let q = question(QuestionType::Number);
        assert_eq!(
            validate_answer(&q, &json!("42")).unwrap(),
            AnswerValue::Number(42.0)
        );
        assert!(matches!(
            validate_answer(&q, &json!("not a number")).unwrap_err(),
            AnswerError::NotNumeric { .. }
        ));
    }

    #[test]
    fn test_text_length_and_pattern() {
        let mut q = question(QuestionType::Text);
        q.validation = Some(ValidationRules {
            min_length: Some(2),
            max_length: Some(5),
            pattern: Some("^[a-z]+$".into()),
            ..Default::default()
        });

        assert!(validate_answer(&q, &json!("abc")).is_ok());
        assert!(matches!(
            validate_answer(&q, &json!("a")).unwrap_err(),
            AnswerError::TooShort { .. }
        ));
        assert!(matches!(
            validate_answer(&q, &json!("abcdef")).unwrap_err(),
            AnswerError::TooLong { .. }
        ));
        assert!(matches!(
            validate_answer(&q, &json!("ABC")).unwrap_err(),
            AnswerError::PatternMismatch { .. }
        ));
        assert!(matches!(
            validate_answer(&q, &json!(12)).unwrap_err(),
            AnswerError::NotText { .. }
        ));
    }

    #[test]
    fn test_select_requires_known_option() {
        let q = with_options(question(QuestionType::Select), &["red", "blue"]);
        assert!(validate_answer(&q, &json!("red")).is_ok());
        let err = validate_answer(&q, &json!("green")).unwrap_err();
        assert!(err.to_string().contains("green"));
    }

    #[test]
    fn test_select_allow_other_accepts_free_text() {
        let mut q = with_options(question(QuestionType::Radio), &["red", "blue"]);
        q.allow_other = true;
        assert_eq!(
            validate_answer(&q, &json!("chartreuse")).unwrap(),
            AnswerValue::Text("chartreuse".into())
        );
    }

    #[test]
    fn test_checkbox_subset_of_options() {
        let q = with_options(question(QuestionType::Checkbox), &["a", "b", "c"]);
        assert_eq!(
            validate_answer(&q, &json!(["a", "c"])).unwrap(),
            AnswerValue::Many(vec!["a".into(), "c".into()])
        );
        let err = validate_answer(&q, &json!(["a", "d"])).unwrap_err();
        assert!(matches!(err, AnswerError::InvalidOption { ref value, .. } if value == "d"));
        assert!(matches!(
            validate_answer(&q, &json!("a")).unwrap_err(),
            AnswerError::NotACollection { .. }
        ));
        assert!(matches!(
            validate_answer(&q, &json!([1, 2])).unwrap_err(),
            AnswerError::NotACollection { .. }
        ));
    }

    #[test]
    fn test_date_and_time_parsing() {
        let d = question(QuestionType::Date);
        assert!(validate_answer(&d, &json!("2026-03-14")).is_ok());
        assert!(validate_answer(&d, &json!("2026-03-14T10:30:00Z")).is_ok());
        assert!(matches!(
            validate_answer(&d, &json!("14/03/2026")).unwrap_err(),
            AnswerError::InvalidDate { .. }
        ));

        let t = question(QuestionType::Time);
        assert!(validate_answer(&t, &json!("10:30")).is_ok());
        assert!(validate_answer(&t, &json!("10:30:15")).is_ok());
        assert!(matches!(
            validate_answer(&t, &json!("25:99")).unwrap_err(),
            AnswerError::InvalidTime { .. }
        ));
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let q = question(QuestionType::Location);
        assert_eq!(
            validate_answer(&q, &json!({"latitude": 59.9, "longitude": 10.7})).unwrap(),
            AnswerValue::Location {
                latitude: 59.9,
                longitude: 10.7
            }
        );
        assert!(matches!(
            validate_answer(&q, &json!({"latitude": 59.9})).unwrap_err(),
            AnswerError::MissingCoordinates { .. }
        ));
        assert!(matches!(
            validate_answer(&q, &json!({"latitude": null, "longitude": 10.7})).unwrap_err(),
            AnswerError::MissingCoordinates { .. }
        ));
    }

    #[test]
    fn test_upload_types_pass_through() {
        let q = question(QuestionType::File);
        let descriptors = json!([{
            "originalName": "photo.jpg",
            "filename": "abc123.jpg",
            "mimetype": "image/jpeg",
            "size": 1024,
            "path": "/uploads/abc123.jpg"
        }]);
        let value = validate_answer(&q, &descriptors).unwrap();
        assert!(matches!(value, AnswerValue::Files(ref f) if f.len() == 1));
    }
}
