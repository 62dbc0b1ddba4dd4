//! `{{VAR}}` substitution inside tool configuration strings.
//!
//! Unlike input bindings, tool config values may embed variables anywhere in
//! a string (`"Bearer {{API_KEY}}"`). Variables that are not set are left
//! verbatim so the unit can report a meaningful error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("env substitution pattern must compile")
});

/// Replace `{{VAR}}` occurrences in a string with values from `env`.
pub fn substitute_env(input: &str, env: &HashMap<String, String>) -> String {
  VAR_PATTERN
    .replace_all(input, |caps: &Captures<'_>| match env.get(&caps[1]) {
      Some(value) => value.clone(),
      None => caps[0].to_string(),
    })
    .into_owned()
}

/// Apply [`substitute_env`] to every string inside a JSON value.
pub fn substitute_env_value(value: &Value, env: &HashMap<String, String>) -> Value {
  match value {
    Value::String(s) => Value::String(substitute_env(s, env)),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), substitute_env_value(v, env)))
        .collect::<Map<String, Value>>(),
    ),
    Value::Array(items) => Value::Array(items.iter().map(|v| substitute_env_value(v, env)).collect()),
    _ => value.clone(),
  }
}
