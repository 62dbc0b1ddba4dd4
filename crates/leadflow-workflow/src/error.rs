use thiserror::Error;

/// Structural problems that prevent a workflow from being compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
  #[error("workflow has no steps")]
  EmptyWorkflow,

  #[error("step at position {index} is missing required field '{field}'")]
  MissingField { index: usize, field: &'static str },

  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },

  #[error("step id '{step_id}' is reserved")]
  ReservedStepId { step_id: String },

  #[error("step '{step_id}' references unknown next step '{next_step}'")]
  UnknownSuccessor { step_id: String, next_step: String },

  #[error("cycle detected in workflow: {}", path.join(" -> "))]
  CycleDetected { path: Vec<String> },
}
