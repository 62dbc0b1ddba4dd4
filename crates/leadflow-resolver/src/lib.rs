//! Leadflow Resolver
//!
//! Resolves a step's input bindings against the current run state before the
//! step executes. Resolution is a pure function of its inputs: the same
//! bindings, state and scope always produce the same mapping.
//!
//! Missing upstream data never fails a step. A placeholder pointing at a step
//! that has not produced a result, or at a key the step did not emit, resolves
//! to `null`, and the unit decides what to do with it.

mod bindings;
mod env;

pub use bindings::{ResolveScope, config_default, resolve_bindings, resolve_value};
pub use env::{substitute_env, substitute_env_value};
