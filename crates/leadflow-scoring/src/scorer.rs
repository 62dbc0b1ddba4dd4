use chrono::Utc;
use leadflow_config::ScoringCriterion;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::defaults::default_criteria;
use crate::error::ScoringError;
use crate::evaluate::evaluate;
use crate::record::{CriterionScore, SCORE_KEYS, ScoredRecord};

/// Score and rank a batch of records.
///
/// Empty `criteria` means the [`default_criteria`] are used. The output has
/// one entry per input record, sorted by `total_score` descending; records
/// with equal scores keep their input order.
#[instrument(skip_all, fields(records = records.len(), criteria = criteria.len()))]
pub fn score(records: &[Value], criteria: &[ScoringCriterion]) -> Vec<ScoredRecord> {
  let defaults;
  let criteria = if criteria.is_empty() {
    debug!("no scoring criteria provided, using defaults");
    defaults = default_criteria();
    defaults.as_slice()
  } else {
    criteria
  };

  let mut scored: Vec<ScoredRecord> = records
    .iter()
    .enumerate()
    .map(|(index, record)| match score_record(index, record, criteria) {
      Ok(scored) => scored,
      Err(e) => {
        warn!(index, error = %e, "failed to score record");
        failed_record(record, e)
      }
    })
    .collect();

  // `sort_by` is stable, so ties keep input order.
  scored.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

  let total = scored.len();
  for (i, record) in scored.iter_mut().enumerate() {
    record.rank = i + 1;
    record.percentile = (total - i) as f64 / total as f64 * 100.0;
  }

  info!(
    scored = total,
    failed = scored.iter().filter(|r| r.is_error()).count(),
    top_score = scored.first().map(|r| r.total_score).unwrap_or(0.0),
    "scoring completed"
  );

  scored
}

fn score_record(
  index: usize,
  record: &Value,
  criteria: &[ScoringCriterion],
) -> Result<ScoredRecord, ScoringError> {
  let fields = record.as_object().ok_or(ScoringError::NotAMapping { index })?;

  let mut breakdown: Vec<CriterionScore> = Vec::new();
  let mut total: f64 = 0.0;
  for criterion in criteria.iter().filter(|c| c.is_active()) {
    let raw_score = evaluate(fields, criterion);
    let entry = CriterionScore {
      field: criterion.field.clone(),
      raw_score,
      weight: criterion.weight,
      weighted_score: raw_score * criterion.weight,
    };
    if !entry.weighted_score.is_finite() {
      return Err(ScoringError::NonFiniteScore {
        field: criterion.field.clone(),
      });
    }
    total += entry.weighted_score;
    // Every criterion counts toward the total; a repeated field only
    // replaces the earlier breakdown entry.
    match breakdown.iter_mut().find(|c| c.field == entry.field) {
      Some(existing) => *existing = entry,
      None => breakdown.push(entry),
    }
  }

  if !total.is_finite() {
    return Err(ScoringError::NonFiniteScore {
      field: "total_score".to_string(),
    });
  }

  Ok(ScoredRecord {
    fields: strip_score_keys(fields),
    total_score: round2(total),
    score_breakdown: breakdown,
    scored_at: Utc::now(),
    rank: 0,
    percentile: 0.0,
    scoring_error: None,
  })
}

fn failed_record(record: &Value, error: ScoringError) -> ScoredRecord {
  let fields = match record {
    Value::Object(map) => strip_score_keys(map),
    other => {
      let mut map = Map::new();
      map.insert("record".to_string(), other.clone());
      map
    }
  };

  ScoredRecord {
    fields,
    total_score: 0.0,
    score_breakdown: Vec::new(),
    scored_at: Utc::now(),
    rank: 0,
    percentile: 0.0,
    scoring_error: Some(error.to_string()),
  }
}

fn strip_score_keys(fields: &Map<String, Value>) -> Map<String, Value> {
  fields
    .iter()
    .filter(|(k, _)| !SCORE_KEYS.contains(&k.as_str()))
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn size_criterion() -> Vec<ScoringCriterion> {
    vec![ScoringCriterion::range("size", 1.0, 100.0, 1000.0)]
  }

  #[test]
  fn test_range_contributions() {
    let records = vec![json!({ "size": 550 }), json!({ "size": 50 }), json!({ "size": 1500 })];
    let scored = score(&records, &size_criterion());

    let totals: Vec<f64> = scored.iter().map(|r| r.total_score).collect();
    assert_eq!(totals, vec![1.0, 0.5, 0.0]);
    assert_eq!(scored[1].breakdown("size").unwrap().weighted_score, 0.5);
  }

  #[test]
  fn test_rank_and_percentile() {
    let records = vec![json!({ "size": 200 }), json!({ "size": 500 })];
    let scored = score(&records, &size_criterion());

    assert_eq!(scored[0].fields["size"], 500);
    assert_eq!(scored[0].total_score, 0.44);
    assert_eq!(scored[0].rank, 1);
    assert_eq!(scored[0].percentile, 100.0);

    assert_eq!(scored[1].fields["size"], 200);
    assert_eq!(scored[1].total_score, 0.11);
    assert_eq!(scored[1].rank, 2);
    assert_eq!(scored[1].percentile, 50.0);
  }

  #[test]
  fn test_ties_keep_input_order() {
    let records = vec![
      json!({ "name": "first", "size": 400 }),
      json!({ "name": "top", "size": 900 }),
      json!({ "name": "second", "size": 400 }),
      json!({ "name": "third", "size": 400 }),
    ];
    let scored = score(&records, &size_criterion());

    let names: Vec<&str> = scored
      .iter()
      .map(|r| r.fields["name"].as_str().unwrap())
      .collect();
    assert_eq!(names, vec!["top", "first", "second", "third"]);
  }

  #[test]
  fn test_weights_are_not_normalized() {
    let criteria = vec![
      ScoringCriterion::expected("funded", 2.0, true),
      ScoringCriterion::presence("email", 1.5),
    ];
    let scored = score(&[json!({ "funded": true, "email": "a@b.co" })], &criteria);
    assert_eq!(scored[0].total_score, 3.5);
  }

  #[test]
  fn test_repeated_field_counts_every_criterion() {
    let criteria = vec![
      ScoringCriterion::range("company_size", 1.0, 100.0, 1000.0),
      ScoringCriterion::presence("company_size", 0.5),
    ];
    let scored = score(&[json!({ "company_size": 1000 })], &criteria);

    assert_eq!(scored[0].total_score, 1.5);
    assert_eq!(scored[0].score_breakdown.len(), 1);
    assert_eq!(scored[0].breakdown("company_size").unwrap().weight, 0.5);
  }

  #[test]
  fn test_non_numeric_string_only_zeroes_its_criterion() {
    let criteria = vec![
      ScoringCriterion::range("size", 1.0, 100.0, 1000.0),
      ScoringCriterion::presence("email", 1.0),
    ];
    let records = vec![
      json!({ "size": "NaN", "email": "a@b.co" }),
      json!({ "size": "inf", "email": "c@d.co" }),
    ];
    let scored = score(&records, &criteria);

    for record in &scored {
      assert!(!record.is_error());
      assert_eq!(record.total_score, 1.0);
      assert_eq!(record.breakdown("size").unwrap().raw_score, 0.0);
    }
  }

  #[test]
  fn test_inactive_criteria_are_skipped() {
    let criteria = vec![
      ScoringCriterion::presence("email", 0.0),
      ScoringCriterion::presence("", 1.0),
      ScoringCriterion::presence("phone", 1.0),
    ];
    let scored = score(&[json!({ "email": "a@b.co", "phone": "555" })], &criteria);

    assert_eq!(scored[0].total_score, 1.0);
    assert_eq!(scored[0].score_breakdown.len(), 1);
    assert!(scored[0].breakdown("email").is_none());
  }

  #[test]
  fn test_default_criteria_are_used_when_empty() {
    let record = json!({
      "company_size": 1000,
      "company_revenue": 200_000_000,
      "recent_funding": true,
      "hiring_sales": true,
      "is_corporate_email": true
    });
    let scored = score(&[record], &[]);

    assert_eq!(scored[0].total_score, 1.0);
    assert_eq!(scored[0].score_breakdown.len(), 5);
  }

  #[test]
  fn test_failing_record_is_isolated() {
    let records = vec![json!({ "size": 1000 }), json!("not a record"), json!({ "size": 550 })];
    let scored = score(&records, &size_criterion());

    assert_eq!(scored.len(), 3);
    assert_eq!(scored[0].total_score, 1.0);
    assert_eq!(scored[1].total_score, 0.5);

    let failed = &scored[2];
    assert_eq!(failed.total_score, 0.0);
    assert!(failed.score_breakdown.is_empty());
    assert_eq!(
      failed.scoring_error.as_deref(),
      Some("record at position 1 is not a mapping")
    );
    assert_eq!(failed.fields["record"], "not a record");
  }

  #[test]
  fn test_non_finite_score_is_a_record_failure() {
    let criteria = vec![ScoringCriterion::range("size", f64::INFINITY, 0.0, 10.0)];
    let scored = score(&[json!({ "size": 0 }), json!({ "size": 5 })], &criteria);

    assert!(scored.iter().all(|r| r.is_error()));
    assert!(scored.iter().all(|r| r.total_score == 0.0));
  }

  #[test]
  fn test_empty_batch() {
    assert!(score(&[], &size_criterion()).is_empty());
  }

  #[test]
  fn test_serialized_shape() {
    let records = vec![json!({ "name": "Acme", "size": 550, "total_score": 99 })];
    let scored = score(&records, &size_criterion());
    let value = serde_json::to_value(&scored[0]).unwrap();

    assert_eq!(value["name"], "Acme");
    assert_eq!(value["total_score"], 0.5);
    assert_eq!(
      value["score_breakdown"],
      json!({ "size": { "raw_score": 0.5, "weight": 1.0, "weighted_score": 0.5 } })
    );
    assert_eq!(value["rank"], 1);
    assert_eq!(value["percentile"], 100.0);
    assert!(value["scored_at"].is_string());
    assert!(value.get("scoring_error").is_none());

    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "name");
  }
}
