//! Run state threaded through one execution.
//!
//! A [`RunState`] is append-only: results are written once per step, and log
//! and error entries are only ever pushed. The engine owns it for the duration
//! of a run; callers receive it back when the run completes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Output payload of a single step.
pub type StepOutput = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  #[default]
  NotStarted,
  Running,
  Completed,
}

/// One line of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
  pub step_id: String,
  pub timestamp: DateTime<Utc>,
  pub success: bool,
  /// Wall-clock seconds spent in the step.
  pub duration: f64,
}

/// A recorded step failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepError {
  pub step_id: String,
  pub error_message: String,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
  #[error("result for step '{step_id}' is already recorded")]
  DuplicateResult { step_id: String },

  #[error("seeded result for '{step_id}' must be a mapping")]
  InvalidSeed { step_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
  pub run_id: String,
  #[serde(default)]
  status: RunStatus,
  start_time: DateTime<Utc>,
  #[serde(default)]
  end_time: Option<DateTime<Utc>>,
  /// Total run time in seconds, set on completion.
  #[serde(default)]
  duration: Option<f64>,
  #[serde(default)]
  current_step: Option<String>,
  #[serde(default)]
  results: Map<String, Value>,
  #[serde(default)]
  execution_log: Vec<LogEntry>,
  #[serde(default)]
  errors: Vec<StepError>,
}

impl Default for RunState {
  fn default() -> Self {
    Self::new()
  }
}

impl RunState {
  /// Create a fresh state with a newly generated run id.
  pub fn new() -> Self {
    let now = Utc::now();
    Self {
      run_id: generate_run_id(now),
      status: RunStatus::NotStarted,
      start_time: now,
      end_time: None,
      duration: None,
      current_step: None,
      results: Map::new(),
      execution_log: Vec::new(),
      errors: Vec::new(),
    }
  }

  /// Create a state whose results are pre-populated, e.g. with data that
  /// upstream systems produced before this run.
  pub fn seeded(results: Map<String, Value>) -> Result<Self, StateError> {
    if let Some((step_id, _)) = results.iter().find(|(_, v)| !v.is_object()) {
      return Err(StateError::InvalidSeed {
        step_id: step_id.clone(),
      });
    }
    Ok(Self {
      results,
      ..Self::new()
    })
  }

  pub fn status(&self) -> RunStatus {
    self.status
  }

  pub fn start_time(&self) -> DateTime<Utc> {
    self.start_time
  }

  pub fn end_time(&self) -> Option<DateTime<Utc>> {
    self.end_time
  }

  pub fn duration(&self) -> Option<f64> {
    self.duration
  }

  pub fn current_step(&self) -> Option<&str> {
    self.current_step.as_deref()
  }

  /// All recorded step outputs, in the order they were written.
  pub fn results(&self) -> &Map<String, Value> {
    &self.results
  }

  pub fn execution_log(&self) -> &[LogEntry] {
    &self.execution_log
  }

  pub fn errors(&self) -> &[StepError] {
    &self.errors
  }

  pub fn has_errors(&self) -> bool {
    !self.errors.is_empty()
  }

  /// Output payload of a step, if it succeeded.
  pub fn result(&self, step_id: &str) -> Option<&StepOutput> {
    self.results.get(step_id).and_then(Value::as_object)
  }

  /// A single key of a step's output.
  pub fn output(&self, step_id: &str, key: &str) -> Option<&Value> {
    self.result(step_id).and_then(|r| r.get(key))
  }

  pub fn has_result(&self, step_id: &str) -> bool {
    self.results.contains_key(step_id)
  }

  pub fn succeeded_steps(&self) -> Vec<&str> {
    self
      .execution_log
      .iter()
      .filter(|e| e.success)
      .map(|e| e.step_id.as_str())
      .collect()
  }

  pub fn failed_steps(&self) -> Vec<&str> {
    self
      .execution_log
      .iter()
      .filter(|e| !e.success)
      .map(|e| e.step_id.as_str())
      .collect()
  }

  /// Mark the run as started. Resets the start time.
  pub fn begin(&mut self) {
    self.status = RunStatus::Running;
    self.start_time = Utc::now();
    self.end_time = None;
    self.duration = None;
  }

  /// Record that a step has been entered.
  pub fn enter_step(&mut self, step_id: &str) {
    self.current_step = Some(step_id.to_string());
  }

  /// Record a successful step. Results are write-once.
  pub fn record_success(
    &mut self,
    step_id: &str,
    output: StepOutput,
    elapsed: Duration,
  ) -> Result<(), StateError> {
    if self.has_result(step_id) {
      return Err(StateError::DuplicateResult {
        step_id: step_id.to_string(),
      });
    }
    self
      .results
      .insert(step_id.to_string(), Value::Object(output));
    self.push_log(step_id, true, elapsed);
    Ok(())
  }

  /// Record a failed step. Never removes prior data.
  pub fn record_failure(&mut self, step_id: &str, message: impl Into<String>, elapsed: Duration) {
    self.errors.push(StepError {
      step_id: step_id.to_string(),
      error_message: message.into(),
      timestamp: Utc::now(),
    });
    self.push_log(step_id, false, elapsed);
  }

  /// Mark the run as completed and compute its duration.
  pub fn finish(&mut self) {
    let end = Utc::now();
    let elapsed = end - self.start_time;
    self.end_time = Some(end);
    self.duration = Some(elapsed.num_microseconds().unwrap_or(0) as f64 / 1_000_000.0);
    self.status = RunStatus::Completed;
  }

  pub fn summary(&self) -> RunSummary {
    RunSummary {
      run_id: self.run_id.clone(),
      status: self.status,
      steps_executed: self.execution_log.len(),
      steps_succeeded: self.execution_log.iter().filter(|e| e.success).count(),
      error_count: self.errors.len(),
      duration: self.duration,
    }
  }

  fn push_log(&mut self, step_id: &str, success: bool, elapsed: Duration) {
    self.execution_log.push(LogEntry {
      step_id: step_id.to_string(),
      timestamp: Utc::now(),
      success,
      duration: elapsed.as_secs_f64(),
    });
  }
}

/// Compact description of a run, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
  pub run_id: String,
  pub status: RunStatus,
  pub steps_executed: usize,
  pub steps_succeeded: usize,
  pub error_count: usize,
  pub duration: Option<f64>,
}

/// Timestamp plus a random suffix, e.g. `run_20250101_120000_1a2b3c4d`.
fn generate_run_id(now: DateTime<Utc>) -> String {
  let suffix = uuid::Uuid::new_v4().simple().to_string();
  format!("run_{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}
