//! Per-criterion evaluation. Every function here returns a raw score in
//! `[0, 1]`; a missing or `null` field always scores `0.0`.

use leadflow_config::{CriterionRule, ScoringCriterion};
use serde_json::{Map, Value};

/// Raw score of one criterion against one record.
pub fn evaluate(record: &Map<String, Value>, criterion: &ScoringCriterion) -> f64 {
  let value = match field_value(record, &criterion.field) {
    Some(Value::Null) | None => return 0.0,
    Some(value) => value,
  };

  match &criterion.rule {
    CriterionRule::Range { min, max } => range_score(value, *min, *max),
    CriterionRule::Expected { value: expected } => expected_score(value, expected),
    CriterionRule::Presence => presence_score(value),
  }
}

/// Look up a dot-separated path (`company.size`) in a record.
pub fn field_value<'r>(record: &'r Map<String, Value>, field: &str) -> Option<&'r Value> {
  let mut parts = field.split('.');
  let first = record.get(parts.next()?)?;
  parts.try_fold(first, |current, part| current.as_object()?.get(part))
}

fn range_score(value: &Value, min: f64, max: f64) -> f64 {
  let Some(n) = as_number(value) else {
    return 0.0;
  };

  if min == max {
    return if n == min { 1.0 } else { 0.0 };
  }
  if n < min {
    0.0
  } else if n > max {
    1.0
  } else {
    (n - min) / (max - min)
  }
}

fn expected_score(value: &Value, expected: &Value) -> f64 {
  let matched = match value {
    Value::String(actual) => render(expected).to_lowercase() == actual.to_lowercase(),
    _ => loosely_equal(value, expected),
  };
  if matched { 1.0 } else { 0.0 }
}

fn presence_score(value: &Value) -> f64 {
  let present = match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|n| n > 0.0),
    Value::String(s) => !s.trim().is_empty(),
    Value::Array(items) => !items.is_empty(),
    Value::Object(map) => !map.is_empty(),
  };
  if present { 1.0 } else { 0.0 }
}

fn as_number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
    _ => None,
  }
}

fn render(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// JSON equality where numbers compare by value and booleans equal 1 / 0.
fn loosely_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
    (Value::Bool(flag), Value::Number(n)) | (Value::Number(n), Value::Bool(flag)) => {
      n.as_f64() == Some(if *flag { 1.0 } else { 0.0 })
    }
    _ => a == b,
  }
}
