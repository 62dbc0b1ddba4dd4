use thiserror::Error;

/// Why a single record could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
  #[error("record at position {index} is not a mapping")]
  NotAMapping { index: usize },

  #[error("score for field '{field}' is not a finite number")]
  NonFiniteScore { field: String },
}
