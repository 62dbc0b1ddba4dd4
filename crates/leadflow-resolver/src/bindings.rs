use std::collections::HashMap;

use leadflow_config::Reference;
use leadflow_workflow::RunState;
use serde_json::{Map, Value};
use tracing::debug;

/// Read-only inputs a binding may address besides prior step results.
#[derive(Debug, Clone, Copy)]
pub struct ResolveScope<'a> {
  pub config: &'a Map<String, Value>,
  pub env: &'a HashMap<String, String>,
}

impl<'a> ResolveScope<'a> {
  pub fn new(config: &'a Map<String, Value>, env: &'a HashMap<String, String>) -> Self {
    Self { config, env }
  }
}

/// Resolve every binding of a step into a concrete input mapping.
pub fn resolve_bindings(
  bindings: &Map<String, Value>,
  state: &RunState,
  scope: &ResolveScope<'_>,
) -> Map<String, Value> {
  bindings
    .iter()
    .map(|(name, value)| (name.clone(), resolve_value(value, state, scope)))
    .collect()
}

/// Resolve a single binding value. Mappings and sequences are walked
/// recursively; other non-string values pass through.
pub fn resolve_value(value: &Value, state: &RunState, scope: &ResolveScope<'_>) -> Value {
  match value {
    Value::String(s) => match Reference::parse(s) {
      Some(reference) => resolve_reference(reference, state, scope),
      None => value.clone(),
    },
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, state, scope)))
        .collect(),
    ),
    Value::Array(items) => Value::Array(
      items
        .iter()
        .map(|v| resolve_value(v, state, scope))
        .collect(),
    ),
    _ => value.clone(),
  }
}

fn resolve_reference(reference: Reference<'_>, state: &RunState, scope: &ResolveScope<'_>) -> Value {
  match reference {
    Reference::Config { path } => {
      if path.is_empty() {
        return Value::Object(scope.config.clone());
      }
      lookup_path(scope.config, path)
        .cloned()
        .unwrap_or_else(|| config_default(path))
    }
    Reference::Env { name } => scope
      .env
      .get(name)
      .map(|v| Value::String(v.clone()))
      .unwrap_or(Value::Null),
    Reference::StepOutput { step_id, key } => {
      let Some(result) = state.result(step_id) else {
        debug!(step_id, key, "no result recorded for referenced step");
        return Value::Null;
      };
      result
        .get(key)
        .or_else(|| key.contains('.').then(|| lookup_path(result, key)).flatten())
        .cloned()
        .unwrap_or(Value::Null)
    }
    Reference::Step { step_id } => state
      .result(step_id)
      .map(|r| Value::Object(r.clone()))
      .unwrap_or(Value::Null),
  }
}

/// Value used when a config path is absent.
///
/// Well-known outreach settings have defaults; anything else resolves to an
/// empty mapping so units can treat it as "nothing configured".
pub fn config_default(path: &str) -> Value {
  match path {
    "outreach.persona" => Value::String("SDR".to_string()),
    "outreach.tone" => Value::String("friendly".to_string()),
    _ => Value::Object(Map::new()),
  }
}

fn lookup_path<'v>(root: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
  let mut segments = path.split('.');
  let first = root.get(segments.next()?)?;
  segments.try_fold(first, |current, segment| current.as_object()?.get(segment))
}
