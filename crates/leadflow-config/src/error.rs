use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read workflow file {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid workflow document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid scoring criteria: {message}")]
  InvalidCriteria { message: String },
}
