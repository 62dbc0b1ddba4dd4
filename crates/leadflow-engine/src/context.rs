use std::collections::HashMap;

use leadflow_resolver::ResolveScope;
use serde_json::{Map, Value};

/// Read-only inputs shared by every step of a run.
///
/// Holds the workflow configuration and a snapshot of environment variables.
/// The engine reads the environment only through this snapshot, so a run is
/// reproducible given the same context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
  pub config: Map<String, Value>,
  pub env: HashMap<String, String>,
}

impl ExecutionContext {
  pub fn new(config: Map<String, Value>) -> Self {
    Self {
      config,
      env: HashMap::new(),
    }
  }

  /// Replace the environment snapshot.
  pub fn with_env<I, K, V>(mut self, vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self.env = vars
      .into_iter()
      .map(|(k, v)| (k.into(), v.into()))
      .collect();
    self
  }

  /// Set a single variable, overriding any snapshot value.
  pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.env.insert(name.into(), value.into());
  }

  pub fn scope(&self) -> ResolveScope<'_> {
    ResolveScope::new(&self.config, &self.env)
  }
}
