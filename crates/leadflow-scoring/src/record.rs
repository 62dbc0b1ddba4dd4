use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys added to a record by scoring. Stale copies are dropped from the
/// input record so re-scoring a ranked list does not duplicate them.
pub(crate) const SCORE_KEYS: &[&str] = &[
  "total_score",
  "score_breakdown",
  "scored_at",
  "rank",
  "percentile",
  "scoring_error",
];

/// Contribution of one criterion to a record's total.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionScore {
  pub field: String,
  pub raw_score: f64,
  pub weight: f64,
  pub weighted_score: f64,
}

/// A record with its score, rank and percentile.
///
/// Serializes as the original record's fields followed by the score fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
  #[serde(flatten)]
  pub fields: Map<String, Value>,
  pub total_score: f64,
  #[serde(serialize_with = "serialize_breakdown")]
  pub score_breakdown: Vec<CriterionScore>,
  pub scored_at: DateTime<Utc>,
  pub rank: usize,
  pub percentile: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scoring_error: Option<String>,
}

impl ScoredRecord {
  /// Look up a criterion's contribution by field name.
  pub fn breakdown(&self, field: &str) -> Option<&CriterionScore> {
    self.score_breakdown.iter().find(|c| c.field == field)
  }

  pub fn is_error(&self) -> bool {
    self.scoring_error.is_some()
  }
}

#[derive(Serialize)]
struct BreakdownEntry {
  raw_score: f64,
  weight: f64,
  weighted_score: f64,
}

fn serialize_breakdown<S: Serializer>(
  breakdown: &[CriterionScore],
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.collect_map(breakdown.iter().map(|c| {
    (
      &c.field,
      BreakdownEntry {
        raw_score: c.raw_score,
        weight: c.weight,
        weighted_score: c.weighted_score,
      },
    )
  }))
}
