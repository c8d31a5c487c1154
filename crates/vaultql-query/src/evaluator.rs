//! Predicate evaluation
//!
//! Comparisons coerce loosely between strings, numbers and booleans and
//! never fail. Absent and null values match nothing except `!=`.

use crate::query::{Condition, Operator};
use crate::resolver;
use std::cmp::Ordering;
use vaultql_core::{DocumentRecord, Value};

/// Evaluate `value <operator> literal`
pub fn evaluate(value: Option<&Value>, operator: Operator, literal: &Value) -> bool {
    let value = value.filter(|v| !v.is_null());

    match operator {
        Operator::Eq => value.is_some_and(|v| loose_eq(v, literal)),
        Operator::NotEq => !value.is_some_and(|v| loose_eq(v, literal)),
        Operator::Gt => value.is_some_and(|v| loose_cmp(v, literal) == Ordering::Greater),
        Operator::Lt => value.is_some_and(|v| loose_cmp(v, literal) == Ordering::Less),
        Operator::Gte => value.is_some_and(|v| loose_cmp(v, literal) != Ordering::Less),
        Operator::Lte => value.is_some_and(|v| loose_cmp(v, literal) != Ordering::Greater),
        Operator::Contains => value.is_some_and(|v| contains(v, literal)),
        Operator::Unknown => false,
    }
}

/// Resolve the condition's field on a record and evaluate it
pub fn matches(record: &DocumentRecord, condition: &Condition) -> bool {
    let value = resolver::resolve(record, &condition.field);
    evaluate(value.as_ref(), condition.operator, &condition.value)
}

/// True when the record satisfies every condition
pub fn matches_all(record: &DocumentRecord, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| matches(record, c))
}

/// Equality with array-contains semantics and type coercion
fn loose_eq(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        (Value::Array(items), _) => items.iter().any(|item| loose_eq(item, literal)),
        (Value::String(a), Value::String(b)) => a.to_lowercase() == b.to_lowercase(),
        _ if value.is_numeric() || literal.is_numeric() => {
            match (value.as_number(), literal.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ if value.is_boolean() || literal.is_boolean() => {
            match (value.as_bool_coerced(), literal.as_bool_coerced()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => value.to_display_string() == literal.to_display_string(),
    }
}

/// Numeric order when both sides are numbers, else string-form order
fn loose_cmp(value: &Value, literal: &Value) -> Ordering {
    match (value.as_number(), literal.as_number()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => value.to_display_string().cmp(&literal.to_display_string()),
    }
}

/// Case-insensitive substring test, element-wise for arrays
fn contains(value: &Value, literal: &Value) -> bool {
    let needle = literal.to_display_string().to_lowercase();
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| item.to_display_string().to_lowercase().contains(&needle)),
        _ => value.to_display_string().to_lowercase().contains(&needle),
    }
}
