//! Leadflow Engine
//!
//! Runs a compiled [`Plan`](leadflow_workflow::Plan) one step at a time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ExecutionEngine                      │
//! │  - instantiates every step's unit before the first step  │
//! │  - resolves bindings against RunState + context          │
//! │  - executes units in plan order, isolating failures      │
//! │  - validates output contracts                            │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                        RunState                          │
//! │  - write-once results, append-only log and errors        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A run never aborts because of a step. Each failure is recorded as a
//! [`StepFailure`] in the run's error list and execution moves on to the next
//! step, whose references to the failed step resolve to `null`.
//!
//! # Usage
//!
//! ```ignore
//! use leadflow_engine::{ExecutionContext, ExecutionEngine};
//! use leadflow_registry::UnitRegistry;
//!
//! let plan = leadflow_workflow::compile(&spec)?;
//! let engine = ExecutionEngine::new(UnitRegistry::with_builtins());
//! let context = ExecutionContext::new(spec.config.clone());
//! let state = engine.execute(&plan, &context, None);
//! ```

mod context;
mod engine;
mod error;
mod events;

pub use context::ExecutionContext;
pub use engine::ExecutionEngine;
pub use error::StepFailure;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
