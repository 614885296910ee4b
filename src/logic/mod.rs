//! Conditional-logic evaluation.
//!
//! Given a question's [`LogicClause`] and the answers collected so far,
//! decides whether the question is applicable: whether it must be
//! answered and validated at all.
//!
//! Rules:
//!
//! - No logic clause: always applicable.
//! - Conditions are AND-combined; there is no OR.
//! - A condition over a missing answer is false.
//! - Conditions satisfied: `show` makes the question applicable,
//!   `hide` and `skip` make it not applicable.
//! - Conditions not satisfied: `show` makes it not applicable (it only
//!   appears when triggered); `hide`/`skip` leave it applicable.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{LogicAction, LogicClause, LogicCondition, LogicOperator, Question};

/// Decide whether `question` must be considered given the answers
/// collected so far, keyed by question id.
pub fn is_applicable(question: &Question, answered: &HashMap<String, Value>) -> bool {
    let Some(clause) = &question.logic else {
        return true;
    };
    let satisfied = clause_satisfied(clause, answered);
    match clause.action {
        LogicAction::Show => satisfied,
        LogicAction::Hide | LogicAction::Skip => !satisfied,
    }
}

/// AND-combine all conditions of a clause. An empty condition list is
/// vacuously satisfied.
pub fn clause_satisfied(clause: &LogicClause, answered: &HashMap<String, Value>) -> bool {
    clause
        .conditions
        .iter()
        .all(|cond| condition_matches(cond, answered))
}

/// Evaluate one condition against the referenced question's answer.
fn condition_matches(cond: &LogicCondition, answered: &HashMap<String, Value>) -> bool {
    let Some(answer) = answered.get(&cond.question_id) else {
        return false;
    };
    compare(cond.operator, answer, &cond.value)
}

fn compare(op: LogicOperator, answer: &Value, expected: &Value) -> bool {
    match op {
        LogicOperator::Eq => loose_eq(answer, expected),
        LogicOperator::NotEq => !loose_eq(answer, expected),
        LogicOperator::GreaterThan => match (as_number(answer), as_number(expected)) {
            (Some(a), Some(b)) => a > b,
            _ => match (answer.as_str(), expected.as_str()) {
                (Some(a), Some(b)) => a > b,
                _ => false,
            },
        },
        LogicOperator::LessThan => match (as_number(answer), as_number(expected)) {
            (Some(a), Some(b)) => a < b,
            _ => match (answer.as_str(), expected.as_str()) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            },
        },
        LogicOperator::Contains => match answer {
            // String answer: expected must be a substring.
            Value::String(s) => expected.as_str().map(|sub| s.contains(sub)).unwrap_or(false),
            // Collection answer: expected must be a member.
            Value::Array(items) => items.iter().any(|item| loose_eq(item, expected)),
            _ => false,
        },
        LogicOperator::In => match expected {
            Value::Array(allowed) => match answer {
                // Checkbox answers are collections; any selected member counts.
                Value::Array(items) => items
                    .iter()
                    .any(|item| allowed.iter().any(|a| loose_eq(item, a))),
                scalar => allowed.iter().any(|a| loose_eq(scalar, a)),
            },
            _ => false,
        },
    }
}

/// Equality with numeric coercion: `7` equals `7.0`; everything else
/// compares by strict JSON equality.
fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x == y;
    }
    a == b
}

fn as_number(v: &Value) -> Option<f64> {
    v.as_f64()
}
