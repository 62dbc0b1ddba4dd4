use leadflow_config::ScoringCriterion;

/// Criteria applied when a caller supplies none.
///
/// Describes a mid-market company that recently raised and is growing its
/// sales team, reached through a corporate address.
pub fn default_criteria() -> Vec<ScoringCriterion> {
  vec![
    ScoringCriterion::range("company_size", 0.3, 100.0, 1000.0),
    ScoringCriterion::range("company_revenue", 0.25, 20_000_000.0, 200_000_000.0),
    ScoringCriterion::expected("recent_funding", 0.2, true),
    ScoringCriterion::expected("hiring_sales", 0.15, true),
    ScoringCriterion::expected("is_corporate_email", 0.1, true),
  ]
}
