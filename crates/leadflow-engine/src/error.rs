use thiserror::Error;

/// Why a step failed. Recorded in the run's error list; never returned from
/// `execute`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepFailure {
  /// No factory is registered for the step's unit type.
  #[error("unknown unit type '{unit_type}'")]
  UnknownUnitType { step_id: String, unit_type: String },

  /// The factory refused to build the unit.
  #[error("failed to construct unit '{unit_type}': {message}")]
  UnitConstruction {
    step_id: String,
    unit_type: String,
    message: String,
  },

  /// The unit returned an error.
  #[error("unit execution failed: {message}")]
  UnitFailed { step_id: String, message: String },

  /// The unit panicked.
  #[error("unit panicked: {message}")]
  UnitPanicked { step_id: String, message: String },

  /// The unit succeeded but its output lacks keys named in the contract.
  #[error("output is missing contract keys: {}", missing.join(", "))]
  ContractViolation { step_id: String, missing: Vec<String> },

  /// The run already holds a result for this step.
  #[error("result for step '{step_id}' is already recorded")]
  DuplicateResult { step_id: String },
}

impl StepFailure {
  pub fn step_id(&self) -> &str {
    match self {
      StepFailure::UnknownUnitType { step_id, .. }
      | StepFailure::UnitConstruction { step_id, .. }
      | StepFailure::UnitFailed { step_id, .. }
      | StepFailure::UnitPanicked { step_id, .. }
      | StepFailure::ContractViolation { step_id, .. }
      | StepFailure::DuplicateResult { step_id } => step_id,
    }
  }
}
