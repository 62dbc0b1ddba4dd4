use chrono::Utc;
use leadflow_config::parse_criteria;
use leadflow_registry::{Capability, RegistryError, UnitError, UnitRegistry, UnitSpec};
use serde_json::{Map, Value, json};

use crate::defaults::default_criteria;
use crate::scorer::score;

/// Unit type names the scoring unit is registered under.
pub const SCORING_UNIT_TYPES: &[&str] = &["ScoringAgent", "Scorer"];

/// Capability that scores the leads handed to it.
///
/// Input:
/// - `enriched_leads` (or `records`): sequence of lead records; `null` or
///   absent means no leads
/// - `scoring_criteria`: `{ "criteria": [...] }` or a bare sequence; absent or
///   empty means the default criteria
///
/// Output: `ranked_leads` and `scoring_metadata`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringUnit;

impl ScoringUnit {
  pub fn from_spec(_spec: &UnitSpec) -> Result<Box<dyn Capability>, RegistryError> {
    Ok(Box::new(ScoringUnit))
  }
}

impl Capability for ScoringUnit {
  fn execute(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, UnitError> {
    let records = match input.get("enriched_leads").or_else(|| input.get("records")) {
      None | Some(Value::Null) => Vec::new(),
      Some(Value::Array(items)) => items.clone(),
      Some(other) => {
        return Err(UnitError::invalid_input(format!(
          "enriched_leads must be a sequence, got {}",
          type_name(other)
        )));
      }
    };

    let criteria = parse_criteria(input.get("scoring_criteria").unwrap_or(&Value::Null))
      .map_err(|e| UnitError::invalid_input(e.to_string()))?;
    let criteria_used = if criteria.is_empty() {
      default_criteria().len()
    } else {
      criteria.len()
    };

    let ranked = score(&records, &criteria);

    let totals: Vec<f64> = ranked.iter().map(|r| r.total_score).collect();
    let min = totals.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = totals.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let average = if totals.is_empty() {
      0.0
    } else {
      totals.iter().sum::<f64>() / totals.len() as f64
    };

    let ranked_leads =
      serde_json::to_value(&ranked).map_err(|e| UnitError::failed(e.to_string()))?;

    let mut output = Map::new();
    output.insert("ranked_leads".to_string(), ranked_leads);
    output.insert(
      "scoring_metadata".to_string(),
      json!({
        "total_leads": records.len(),
        "scoring_criteria_used": criteria_used,
        "scoring_timestamp": Utc::now().to_rfc3339(),
        "score_range": { "min": min, "max": max },
        "top_score": totals.first().copied().unwrap_or(0.0),
        "average_score": average,
      }),
    );
    Ok(output)
  }
}

/// Register the scoring unit under each of [`SCORING_UNIT_TYPES`].
pub fn register(registry: &mut UnitRegistry) -> Result<(), RegistryError> {
  for unit_type in SCORING_UNIT_TYPES {
    registry.register(*unit_type, ScoringUnit::from_spec)?;
  }
  Ok(())
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "sequence",
    Value::Object(_) => "mapping",
  }
}
