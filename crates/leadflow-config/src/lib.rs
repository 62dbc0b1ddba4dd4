//! Leadflow Config
//!
//! This crate contains the serializable workflow specification types for leadflow.
//! These types represent a pipeline definition before it is compiled into an
//! execution plan by `leadflow-workflow`.
//!
//! Specifications are loaded from JSON documents. Field names follow the
//! leadflow schema, but the older document layout (`workflow_name`, `agent`,
//! `inputs`, `output_schema`) is accepted through serde aliases.
//!
//! ```json
//! {
//!   "name": "outbound",
//!   "config": { "scoring": { "criteria": [] } },
//!   "steps": [
//!     {
//!       "id": "score",
//!       "unit_type": "ScoringAgent",
//!       "input_bindings": { "enriched_leads": "{{enrich.leads}}" },
//!       "next_steps": []
//!     }
//!   ]
//! }
//! ```

mod criterion;
mod error;
mod reference;
mod step;
mod workflow;

pub use criterion::{CriterionRule, ScoringCriterion, parse_criteria};
pub use error::ConfigError;
pub use reference::{RESERVED_STEP_IDS, Reference};
pub use step::{StepSpec, ToolSpec};
pub use workflow::{StepSummary, WorkflowSpec, WorkflowSummary};
