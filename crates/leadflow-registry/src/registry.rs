use std::collections::HashMap;

use tracing::debug;

use crate::capability::{Capability, UnitSpec};
use crate::error::RegistryError;
use crate::passthrough::{PASSTHROUGH_UNIT, PassthroughUnit};

/// Builds a unit for a step.
pub type UnitFactory =
  Box<dyn Fn(&UnitSpec) -> Result<Box<dyn Capability>, RegistryError> + Send + Sync>;

/// Lookup contract the engine consumes.
pub trait CapabilityRegistry: Send + Sync {
  /// Find the factory for a unit type.
  fn lookup(&self, unit_type: &str) -> Option<&UnitFactory>;

  /// Build a unit for the given spec.
  fn instantiate(&self, spec: &UnitSpec) -> Result<Box<dyn Capability>, RegistryError> {
    let factory = self
      .lookup(&spec.unit_type)
      .ok_or_else(|| RegistryError::UnknownUnitType {
        unit_type: spec.unit_type.clone(),
      })?;
    factory(spec)
  }
}

/// In-memory registry keyed by unit type name.
#[derive(Default)]
pub struct UnitRegistry {
  factories: HashMap<String, UnitFactory>,
}

impl UnitRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry with the built-in units.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    registry
      .factories
      .insert(PASSTHROUGH_UNIT.to_string(), Box::new(passthrough_factory));
    registry
  }

  /// Register a factory under a unit type name.
  pub fn register<F>(&mut self, unit_type: impl Into<String>, factory: F) -> Result<(), RegistryError>
  where
    F: Fn(&UnitSpec) -> Result<Box<dyn Capability>, RegistryError> + Send + Sync + 'static,
  {
    let unit_type = unit_type.into();
    if self.factories.contains_key(&unit_type) {
      return Err(RegistryError::AlreadyRegistered { unit_type });
    }
    debug!(unit_type = %unit_type, "registered unit type");
    self.factories.insert(unit_type, Box::new(factory));
    Ok(())
  }

  pub fn contains(&self, unit_type: &str) -> bool {
    self.factories.contains_key(unit_type)
  }

  /// Registered unit type names, sorted.
  pub fn unit_types(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}

impl CapabilityRegistry for UnitRegistry {
  fn lookup(&self, unit_type: &str) -> Option<&UnitFactory> {
    self.factories.get(unit_type)
  }
}

fn passthrough_factory(_spec: &UnitSpec) -> Result<Box<dyn Capability>, RegistryError> {
  Ok(Box::new(PassthroughUnit))
}

impl std::fmt::Debug for UnitRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UnitRegistry")
      .field("unit_types", &self.unit_types())
      .finish()
  }
}
