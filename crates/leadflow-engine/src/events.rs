//! Execution events and notifiers.
//!
//! The engine reports progress through an [`ExecutionNotifier`] passed at
//! construction. Nothing is written to process-wide state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Events emitted during a run, in the order they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// A run has started. `steps` is the length of the plan.
  RunStarted {
    run_id: String,
    workflow: String,
    steps: usize,
  },

  /// A step has been entered and its unit is about to run.
  StepStarted {
    run_id: String,
    step_id: String,
    unit_type: String,
  },

  /// A step succeeded. `data` is the output recorded for it.
  StepCompleted {
    run_id: String,
    step_id: String,
    duration_ms: u64,
    data: Value,
  },

  /// A step failed. `error` is the message recorded in the run's errors.
  StepFailed {
    run_id: String,
    step_id: String,
    duration_ms: u64,
    error: String,
  },

  /// Always the last event of a run, whether or not steps failed.
  RunCompleted {
    run_id: String,
    succeeded: usize,
    failed: usize,
  },
}

/// Receives execution events.
///
/// The engine calls `notify` synchronously from the run loop, so
/// implementations should hand events off rather than do slow work inline.
pub trait ExecutionNotifier: Send + Sync {
  /// Called once per event, in emission order.
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events. The default for engines built with `new`.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel so they can be consumed
/// asynchronously while the engine keeps running.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Wrap an existing sender.
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
