use leadflow_config::{StepSpec, ToolSpec};
use serde_json::{Map, Value};

use crate::error::UnitError;

/// A unit of work with a single operation.
///
/// Implementations must not panic for bad input; they report it as
/// [`UnitError::InvalidInput`]. The engine still isolates panics, but a
/// panicking unit loses its error message.
pub trait Capability: Send + Sync {
  fn execute(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, UnitError>;
}

/// Everything a factory may use to build a unit for one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitSpec {
  pub step_id: String,
  pub unit_type: String,
  /// Free-form text from the workflow, uninterpreted by the engine.
  pub instructions: String,
  /// Tool configuration with environment variables already substituted.
  pub tools: Vec<ToolSpec>,
  pub output_contract: Map<String, Value>,
}

impl UnitSpec {
  /// Build a spec from a step, using the step's tools as given.
  pub fn from_step(step: &StepSpec) -> Self {
    Self {
      step_id: step.id.clone(),
      unit_type: step.unit_type.clone(),
      instructions: step.instructions.clone(),
      tools: step.tools.clone(),
      output_contract: step.output_contract.clone(),
    }
  }

  pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
    self.tools = tools;
    self
  }

  /// Configuration of the named tool, if present.
  pub fn tool(&self, name: &str) -> Option<&Map<String, Value>> {
    self.tools.iter().find(|t| t.name == name).map(|t| &t.config)
  }
}
