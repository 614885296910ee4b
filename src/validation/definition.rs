//! Survey definition checks, applied at import time.
//!
//! Two layers:
//!
//! 1. JSON Schema (draft 7) validation of the raw definition document,
//!    against the schema embedded from `schemas/survey-definition.json`.
//! 2. Logic-graph checks over the materialized questions: conditions
//!    must reference existing questions, never the owning question
//!    itself, and must not form a dependency cycle. Rejecting cycles at
//!    save time keeps evaluation order trivially well-defined.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{DefinitionError, DefinitionResult};
use crate::models::Question;

/// Validate a raw definition document against the embedded JSON Schema.
pub fn validate_definition(data: &Value) -> DefinitionResult<()> {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/survey-definition.json"))
        .expect("Invalid embedded schema");
    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| DefinitionError::Schema(vec![format!("Invalid schema: {e}")]))?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DefinitionError::Schema(errors))
    }
}

/// Quick check against the embedded definition schema.
pub fn is_valid_definition(data: &Value) -> bool {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/survey-definition.json"))
        .expect("Invalid embedded schema");
    jsonschema::draft7::is_valid(&schema, data)
}

/// Check the conditional-logic dependency graph of a question set.
///
/// Edges run from a question to every question its conditions
/// reference. Errors: unknown reference, self-reference, cycle.
pub fn check_logic_graph(questions: &[Question]) -> DefinitionResult<()> {
    let ids: HashMap<&str, usize> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id.as_str(), i))
        .collect();

    // Adjacency by index, validating references on the way.
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); questions.len()];
    for (i, question) in questions.iter().enumerate() {
        let Some(clause) = &question.logic else { continue };
        for cond in &clause.conditions {
            if cond.question_id == question.id {
                return Err(DefinitionError::SelfReference(question.label.clone()));
            }
            match ids.get(cond.question_id.as_str()) {
                Some(&target) => edges[i].push(target),
                None => {
                    return Err(DefinitionError::UnknownReference {
                        question: question.label.clone(),
                        reference: cond.question_id.clone(),
                    })
                }
            }
        }
    }

    // Iterative DFS, three-color.
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        White,
        Grey,
        Black,
    }
    let mut marks = vec![Mark::White; questions.len()];

    for start in 0..questions.len() {
        if marks[start] != Mark::White {
            continue;
        }
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::Grey;
        while let Some(&mut (node, ref mut cursor)) = stack.last_mut() {
            let edge_idx = *cursor;
            if edge_idx < edges[node].len() {
                *cursor += 1;
                let next = edges[node][edge_idx];
                match marks[next] {
                    Mark::Grey => {
                        return Err(DefinitionError::LogicCycle(
                            questions[next].label.clone(),
                        ));
                    }
                    Mark::White => {
                        marks[next] = Mark::Grey;
                        stack.push((next, 0));
                    }
                    Mark::Black => {}
                }
            } else {
                marks[node] = Mark::Black;
                stack.pop();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogicAction, LogicClause, LogicCondition, LogicOperator, QuestionType};
    use serde_json::json;

    fn question(id: &str, references: &[&str]) -> Question {
        let logic = if references.is_empty() {
            None
        } else {
            Some(LogicClause {
                conditions: references
                    .iter()
                    .map(|r| LogicCondition {
                        question_id: r.to_string(),
                        operator: LogicOperator::Eq,
                        value: json!("x"),
                    })
                    .collect(),
                action: LogicAction::Show,
            })
        };
        Question {
            id: id.into(),
            survey_id: "s1".into(),
            question_type: QuestionType::Text,
            label: format!("Question {id}"),
            description: None,
            placeholder: None,
            required: false,
            order: 0,
            options: None,
            validation: None,
            logic,
            parent_question_id: None,
            group_id: None,
            allow_other: false,
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_valid_definition_passes_schema() {
        let def = json!({
            "title": "Customer feedback",
            "questions": [
                { "type": "text", "label": "Your name" },
                {
                    "type": "radio",
                    "label": "Satisfied?",
                    "required": true,
                    "options": [
                        { "label": "Yes", "value": "yes" },
                        { "label": "No", "value": "no" }
                    ]
                }
            ]
        });
        assert!(is_valid_definition(&def));
        assert!(validate_definition(&def).is_ok());
    }

    #[test]
    fn test_definition_without_title_rejected() {
        let def = json!({ "questions": [] });
        let err = validate_definition(&def).unwrap_err();
        assert!(matches!(err, DefinitionError::Schema(_)));
    }

    #[test]
    fn test_definition_with_bad_type_rejected() {
        let def = json!({
            "title": "x",
            "questions": [{ "type": "hologram", "label": "q" }]
        });
        assert!(!is_valid_definition(&def));
    }

    #[test]
    fn test_definition_with_bad_operator_rejected() {
        let def = json!({
            "title": "x",
            "questions": [{
                "type": "text",
                "label": "q",
                "logic": {
                    "action": "show",
                    "conditions": [{ "questionId": "a", "operator": "~=", "value": 1 }]
                }
            }]
        });
        assert!(!is_valid_definition(&def));
    }

    #[test]
    fn test_graph_accepts_backward_chain() {
        let questions = vec![
            question("a", &[]),
            question("b", &["a"]),
            question("c", &["a", "b"]),
        ];
        assert!(check_logic_graph(&questions).is_ok());
    }

    #[test]
    fn test_graph_rejects_self_reference() {
        let questions = vec![question("a", &["a"])];
        assert!(matches!(
            check_logic_graph(&questions).unwrap_err(),
            DefinitionError::SelfReference(_)
        ));
    }

    #[test]
    fn test_graph_rejects_unknown_reference() {
        let questions = vec![question("a", &["ghost"])];
        assert!(matches!(
            check_logic_graph(&questions).unwrap_err(),
            DefinitionError::UnknownReference { .. }
        ));
    }

    #[test]
    fn test_graph_rejects_cycle() {
        let questions = vec![question("a", &["b"]), question("b", &["a"])];
        assert!(matches!(
            check_logic_graph(&questions).unwrap_err(),
            DefinitionError::LogicCycle(_)
        ));
    }

    #[test]
    fn test_graph_rejects_longer_cycle() {
        let questions = vec![
            question("a", &["c"]),
            question("b", &["a"]),
            question("c", &["b"]),
        ];
        assert!(check_logic_graph(&questions).is_err());
    }
}
