use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
  /// Unique step identifier, also the key under which its output is recorded.
  #[serde(default)]
  pub id: String,

  /// Name looked up in the capability registry, e.g. "ScoringAgent".
  #[serde(default, alias = "agent")]
  pub unit_type: String,

  /// Free-form instructions handed to the unit untouched.
  #[serde(default)]
  pub instructions: String,

  /// Input parameter name to literal value or placeholder string.
  #[serde(default, alias = "inputs")]
  pub input_bindings: Map<String, Value>,

  /// Keys the unit's output must contain. Values describe the expected shape
  /// and are informational only.
  #[serde(default, alias = "output_schema", skip_serializing_if = "Map::is_empty")]
  pub output_contract: Map<String, Value>,

  /// Tool configuration passed to the unit constructor.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tools: Vec<ToolSpec>,

  /// Successor step ids. Empty marks the step terminal; only the first entry
  /// is followed.
  #[serde(default)]
  pub next_steps: Vec<String>,
}

impl StepSpec {
  pub fn new(id: impl Into<String>, unit_type: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      unit_type: unit_type.into(),
      instructions: String::new(),
      input_bindings: Map::new(),
      output_contract: Map::new(),
      tools: Vec::new(),
      next_steps: Vec::new(),
    }
  }

  pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.input_bindings.insert(name.into(), value.into());
    self
  }

  pub fn with_next(mut self, next: impl Into<String>) -> Self {
    self.next_steps.push(next.into());
    self
  }

  pub fn with_contract_key(mut self, key: impl Into<String>) -> Self {
    self.output_contract.insert(key.into(), Value::Null);
    self
  }

  pub fn is_terminal(&self) -> bool {
    self.next_steps.is_empty()
  }
}

/// A tool made available to a unit, e.g. an API client configuration.
///
/// String values in `config` may embed `{{VAR_NAME}}` environment references,
/// which are substituted when the unit is instantiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
  pub name: String,
  #[serde(default)]
  pub config: Map<String, Value>,
}
