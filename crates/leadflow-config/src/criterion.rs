//! Scoring criteria as they appear in workflow configuration.
//!
//! A criterion names a record field (dot-path), a weight, and how the field is
//! evaluated. The evaluation kind is inferred from which keys are present:
//!
//! ```json
//! { "field": "company_size", "weight": 0.3, "min": 100, "max": 1000 }
//! { "field": "recent_funding", "weight": 0.2, "value": true }
//! { "field": "linkedin_url", "weight": 0.1 }
//! ```
//!
//! `min` and `max` must both be present for a range criterion; a lone bound is
//! ignored and the criterion falls back to the next applicable kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCriterion", into = "RawCriterion")]
pub struct ScoringCriterion {
  pub field: String,
  pub weight: f64,
  pub rule: CriterionRule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CriterionRule {
  /// Clamped-linear score between `min` and `max`.
  Range { min: f64, max: f64 },
  /// 1.0 when the field equals `value`.
  Expected { value: Value },
  /// 1.0 when the field holds a non-empty, non-zero, truthy value.
  Presence,
}

impl ScoringCriterion {
  pub fn range(field: impl Into<String>, weight: f64, min: f64, max: f64) -> Self {
    Self {
      field: field.into(),
      weight,
      rule: CriterionRule::Range { min, max },
    }
  }

  pub fn expected(field: impl Into<String>, weight: f64, value: impl Into<Value>) -> Self {
    Self {
      field: field.into(),
      weight,
      rule: CriterionRule::Expected {
        value: value.into(),
      },
    }
  }

  pub fn presence(field: impl Into<String>, weight: f64) -> Self {
    Self {
      field: field.into(),
      weight,
      rule: CriterionRule::Presence,
    }
  }

  /// Criteria without a field or with a non-positive weight contribute nothing.
  pub fn is_active(&self) -> bool {
    !self.field.is_empty() && self.weight > 0.0
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCriterion {
  #[serde(default)]
  field: String,
  #[serde(default)]
  weight: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  max: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  value: Option<Value>,
}

impl From<RawCriterion> for ScoringCriterion {
  fn from(raw: RawCriterion) -> Self {
    let rule = match (raw.min, raw.max, raw.value) {
      (Some(min), Some(max), _) => CriterionRule::Range { min, max },
      (_, _, Some(value)) => CriterionRule::Expected { value },
      _ => CriterionRule::Presence,
    };
    Self {
      field: raw.field,
      weight: raw.weight,
      rule,
    }
  }
}

impl From<ScoringCriterion> for RawCriterion {
  fn from(criterion: ScoringCriterion) -> Self {
    let (min, max, value) = match criterion.rule {
      CriterionRule::Range { min, max } => (Some(min), Some(max), None),
      CriterionRule::Expected { value } => (None, None, Some(value)),
      CriterionRule::Presence => (None, None, None),
    };
    Self {
      field: criterion.field,
      weight: criterion.weight,
      min,
      max,
      value,
    }
  }
}

/// Parse criteria from a configuration value.
///
/// Accepts either `{ "criteria": [...] }` (the shape of `config.scoring`) or a
/// bare sequence. `null` and an object without `criteria` yield no criteria.
pub fn parse_criteria(value: &Value) -> Result<Vec<ScoringCriterion>, ConfigError> {
  let list = match value {
    Value::Null => return Ok(Vec::new()),
    Value::Array(_) => value,
    Value::Object(map) => match map.get("criteria") {
      Some(criteria) => criteria,
      None => return Ok(Vec::new()),
    },
    other => {
      return Err(ConfigError::InvalidCriteria {
        message: format!("expected a sequence or mapping, got {}", other),
      });
    }
  };

  serde_json::from_value(list.clone()).map_err(|e| ConfigError::InvalidCriteria {
    message: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_rule_inferred_from_keys() {
    let range: ScoringCriterion =
      serde_json::from_value(json!({ "field": "size", "weight": 1.0, "min": 100, "max": 1000 }))
        .unwrap();
    assert_eq!(range.rule, CriterionRule::Range { min: 100.0, max: 1000.0 });

    let expected: ScoringCriterion =
      serde_json::from_value(json!({ "field": "hiring", "weight": 0.5, "value": true })).unwrap();
    assert_eq!(expected.rule, CriterionRule::Expected { value: json!(true) });

    let presence: ScoringCriterion =
      serde_json::from_value(json!({ "field": "website", "weight": 0.1 })).unwrap();
    assert_eq!(presence.rule, CriterionRule::Presence);
  }

  #[test]
  fn test_lone_bound_is_not_a_range() {
    let c: ScoringCriterion =
      serde_json::from_value(json!({ "field": "size", "weight": 1.0, "min": 100 })).unwrap();
    assert_eq!(c.rule, CriterionRule::Presence);
  }

  #[test]
  fn test_range_wins_over_value() {
    let c: ScoringCriterion = serde_json::from_value(
      json!({ "field": "size", "weight": 1.0, "min": 1, "max": 2, "value": 5 }),
    )
    .unwrap();
    assert!(matches!(c.rule, CriterionRule::Range { .. }));
  }

  #[test]
  fn test_serializes_back_to_flat_shape() {
    let c = ScoringCriterion::range("size", 0.3, 100.0, 1000.0);
    let value = serde_json::to_value(&c).unwrap();
    assert_eq!(
      value,
      json!({ "field": "size", "weight": 0.3, "min": 100.0, "max": 1000.0 })
    );
  }

  #[test]
  fn test_is_active() {
    assert!(ScoringCriterion::presence("a", 0.1).is_active());
    assert!(!ScoringCriterion::presence("a", 0.0).is_active());
    assert!(!ScoringCriterion::presence("", 1.0).is_active());
  }

  #[test]
  fn test_parse_criteria_shapes() {
    let wrapped = json!({ "criteria": [{ "field": "a", "weight": 1.0 }] });
    assert_eq!(parse_criteria(&wrapped).unwrap().len(), 1);

    let bare = json!([{ "field": "a", "weight": 1.0 }, { "field": "b", "weight": 2.0 }]);
    assert_eq!(parse_criteria(&bare).unwrap().len(), 2);

    assert!(parse_criteria(&json!({})).unwrap().is_empty());
    assert!(parse_criteria(&Value::Null).unwrap().is_empty());
  }

  #[test]
  fn test_parse_criteria_rejects_scalars() {
    let err = parse_criteria(&json!("size")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCriteria { .. }));

    let err = parse_criteria(&json!([{ "field": "a", "weight": "heavy" }])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCriteria { .. }));
  }
}
