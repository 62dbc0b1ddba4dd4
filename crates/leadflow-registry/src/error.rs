use thiserror::Error;

/// Errors from looking up or constructing units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error("unknown unit type: {unit_type}")]
  UnknownUnitType { unit_type: String },

  #[error("unit type already registered: {unit_type}")]
  AlreadyRegistered { unit_type: String },

  #[error("failed to construct unit '{unit_type}': {message}")]
  Construction { unit_type: String, message: String },
}

/// Failure reported by a unit's `execute`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
  /// The input did not have the shape the unit needs.
  #[error("invalid input: {message}")]
  InvalidInput { message: String },

  /// The unit ran but could not produce a result.
  #[error("{message}")]
  Failed { message: String },
}

impl UnitError {
  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::InvalidInput {
      message: message.into(),
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}
