//! Comparison evaluator for conditional edges

use super::ast::CompareOp;
use crate::adk::error::FlowError;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Evaluate `left op right`.
///
/// `==` and `!=` never fail: values of different kinds are unequal.
/// Ordering operators need both sides to be numbers, strings, booleans or
/// arrays of the same kind, and fail with `TypeMismatch` otherwise.
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, FlowError> {
    match op {
        CompareOp::Eq => Ok(values_equal(left, right)),
        CompareOp::NotEq => Ok(!values_equal(left, right)),
        CompareOp::Lt => ordering(left, op, right).map(|o| o == Ordering::Less),
        CompareOp::Lte => ordering(left, op, right).map(|o| o != Ordering::Greater),
        CompareOp::Gt => ordering(left, op, right).map(|o| o == Ordering::Greater),
        CompareOp::Gte => ordering(left, op, right).map(|o| o != Ordering::Less),
    }
}

fn ordering(left: &Value, op: CompareOp, right: &Value) -> Result<Ordering, FlowError> {
    order_values(left, right).ok_or_else(|| FlowError::TypeMismatch {
        left: left.to_string(),
        op: op.to_string(),
        right: right.to_string(),
    })
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => order_numbers(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => left == right,
    }
}

fn order_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => order_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            // First differing element decides, then length
            for (x, y) in a.iter().zip(b) {
                if !values_equal(x, y) {
                    return order_values(x, y);
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => None,
    }
}

/// Integers compare exactly; a float on either side compares as `f64`
fn order_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if a.is_f64() || b.is_f64() {
        return a.as_f64()?.partial_cmp(&b.as_f64()?);
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        // At least one side is a u64 above i64::MAX
        _ => match (a.as_u64(), b.as_u64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            (Some(_), None) => Some(Ordering::Greater),
            (None, Some(_)) => Some(Ordering::Less),
            (None, None) => None,
        },
    }
}
