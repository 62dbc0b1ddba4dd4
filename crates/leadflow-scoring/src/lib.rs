//! Leadflow Scoring
//!
//! Scores records against weighted criteria and ranks them.
//!
//! Each active criterion produces a raw score in `[0, 1]` that is multiplied
//! by its weight. The weighted contributions are summed (not normalized) and
//! rounded to two decimals. Records are then sorted by total score, highest
//! first, with ties keeping their input order, and given a 1-based rank and a
//! percentile.
//!
//! A record that cannot be scored is still emitted, with a zero score and the
//! reason in `scoring_error`; it never prevents the rest of the batch from
//! being scored.

mod defaults;
mod error;
mod evaluate;
mod record;
mod scorer;
mod unit;

pub use defaults::default_criteria;
pub use error::ScoringError;
pub use evaluate::{evaluate, field_value};
pub use record::{CriterionScore, ScoredRecord};
pub use scorer::score;
pub use unit::{SCORING_UNIT_TYPES, ScoringUnit, register};
