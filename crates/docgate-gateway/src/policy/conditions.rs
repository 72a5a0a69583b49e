//! Value-conditioned rules.
//!
//! A rule constrains one field of submitted data, either by enumeration or by
//! `in` / `not_in` / `min` / `max` clauses. Fields absent from the submitted
//! data are never evaluated. Ordering is the value's natural one: numbers
//! numerically, strings lexicographically, booleans false < true. Values of
//! different kinds are not comparable and fail the bound they are checked
//! against.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::config::schema::{ConditionBounds, ConditionRule, FieldRules};

/// Evaluate every rule whose field is present in `data`, in configured order.
/// Returns the violation message of the first failing field.
pub fn check_conditions(
    rules: &FieldRules,
    data: &Map<String, Value>,
) -> Result<(), String> {
    for (field, rule) in rules {
        if let Some(value) = data.get(field) {
            check_rule(field, value, rule)?;
        }
    }
    Ok(())
}

pub fn check_rule(field: &str, value: &Value, rule: &ConditionRule) -> Result<(), String> {
    match rule {
        ConditionRule::Values(allowed) => {
            if !contains(allowed, value) {
                return Err(format!(
                    "Field '{field}' value '{}' not in allowed values: {}",
                    display(value),
                    Value::Array(allowed.clone())
                ));
            }
            Ok(())
        }
        ConditionRule::Bounds(bounds) => check_bounds(field, value, bounds),
    }
}

fn check_bounds(field: &str, value: &Value, b: &ConditionBounds) -> Result<(), String> {
    if let Some(allowed) = &b.in_values {
        if !contains(allowed, value) {
            return Err(format!(
                "Field '{field}' value '{}' not in allowed values",
                display(value)
            ));
        }
    }
    if let Some(forbidden) = &b.not_in {
        if contains(forbidden, value) {
            return Err(format!(
                "Field '{field}' value '{}' is in forbidden values",
                display(value)
            ));
        }
    }
    if let Some(min) = &b.min {
        match compare(value, min) {
            Some(Ordering::Less) => {
                return Err(format!(
                    "Field '{field}' value '{}' below minimum: {}",
                    display(value),
                    display(min)
                ))
            }
            Some(_) => {}
            None => return Err(incomparable(field, value, min)),
        }
    }
    if let Some(max) = &b.max {
        match compare(value, max) {
            Some(Ordering::Greater) => {
                return Err(format!(
                    "Field '{field}' value '{}' above maximum: {}",
                    display(value),
                    display(max)
                ))
            }
            Some(_) => {}
            None => return Err(incomparable(field, value, max)),
        }
    }
    Ok(())
}

fn incomparable(field: &str, value: &Value, bound: &Value) -> String {
    format!(
        "Field '{field}' value '{}' is not comparable with {}",
        display(value),
        display(bound)
    )
}

/// Membership with numeric equality across integer/float representations.
fn contains(list: &[Value], value: &Value) -> bool {
    list.iter().any(|v| values_equal(v, value))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Strings render bare, everything else as JSON.
pub(crate) fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
