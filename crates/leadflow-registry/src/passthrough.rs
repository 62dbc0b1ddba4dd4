use serde_json::{Map, Value};

use crate::capability::Capability;
use crate::error::UnitError;

/// Registry name of [`PassthroughUnit`].
pub const PASSTHROUGH_UNIT: &str = "Passthrough";

/// Returns its resolved input as output. Lets a workflow inject static data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughUnit;

impl Capability for PassthroughUnit {
  fn execute(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, UnitError> {
    Ok(input.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_passthrough_returns_input() {
    let input = json!({ "leads": [{ "name": "Ada" }], "count": 1 })
      .as_object()
      .cloned()
      .unwrap();

    assert_eq!(PassthroughUnit.execute(&input).unwrap(), input);
  }
}
