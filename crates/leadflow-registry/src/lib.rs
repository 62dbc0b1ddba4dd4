//! Leadflow Registry
//!
//! A step names a unit type (`"ScoringAgent"`, `"Passthrough"`, ...). The
//! registry maps that name to a factory producing a [`Capability`], the
//! single-operation interface every unit implements.
//!
//! Units are built once per run from a [`UnitSpec`] and then executed with
//! the step's resolved input. Execution returns an explicit `Result`; a unit
//! never signals failure by any other channel.

mod capability;
mod error;
mod passthrough;
mod registry;

pub use capability::{Capability, UnitSpec};
pub use error::{RegistryError, UnitError};
pub use passthrough::{PASSTHROUGH_UNIT, PassthroughUnit};
pub use registry::{CapabilityRegistry, UnitFactory, UnitRegistry};
