use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::step::StepSpec;

/// A declarative pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
  #[serde(default, alias = "workflow_name")]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub version: String,
  /// Shared settings addressed by `{{config.<path>}}` bindings.
  #[serde(default)]
  pub config: Map<String, Value>,
  /// Steps in declaration order. The first one is the entry point.
  #[serde(default)]
  pub steps: Vec<StepSpec>,
}

impl WorkflowSpec {
  pub fn new(name: impl Into<String>, steps: Vec<StepSpec>) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      version: String::new(),
      config: Map::new(),
      steps,
    }
  }

  /// Parse a workflow from a JSON document.
  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Read and parse a workflow file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&content)
  }

  /// Get a step by id.
  pub fn step(&self, id: &str) -> Option<&StepSpec> {
    self.steps.iter().find(|s| s.id == id)
  }

  pub fn summary(&self) -> WorkflowSummary {
    WorkflowSummary {
      name: self.name.clone(),
      description: self.description.clone(),
      version: self.version.clone(),
      total_steps: self.steps.len(),
      steps: self
        .steps
        .iter()
        .map(|s| StepSummary {
          id: s.id.clone(),
          unit_type: s.unit_type.clone(),
          next_steps: s.next_steps.clone(),
        })
        .collect(),
      config: self.config.clone(),
    }
  }
}

/// Overview of a workflow, suitable for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
  pub name: String,
  pub description: String,
  pub version: String,
  pub total_steps: usize,
  pub steps: Vec<StepSummary>,
  pub config: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
  pub id: String,
  pub unit_type: String,
  pub next_steps: Vec<String>,
}
