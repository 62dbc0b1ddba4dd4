//! Leadflow Workflow
//!
//! This crate turns a [`WorkflowSpec`](leadflow_config::WorkflowSpec) into an
//! executable [`Plan`] and defines the [`RunState`] record that the engine
//! threads through a run.
//!
//! Compilation:
//! - Validates step ids (present, unique, not reserved) and successor references
//! - Follows the first declared successor of each step from the entry point
//! - Rejects cycles, since a plan is a line and not a general graph
//! - Reports non-fatal findings (ignored successors, unreachable steps,
//!   bindings naming unknown steps) as [`CompileWarning`]s

mod error;
mod graph;
mod plan;
mod state;

pub use error::CompileError;
pub use graph::Graph;
pub use plan::{CompileWarning, Plan, compile};
pub use state::{LogEntry, RunState, RunStatus, RunSummary, StateError, StepError, StepOutput};
