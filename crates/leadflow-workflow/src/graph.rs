use std::collections::{HashMap, HashSet};

use leadflow_config::StepSpec;

use crate::error::CompileError;

/// Successor structure of a workflow.
///
/// Every step keeps its declared successors, but only the first one is an
/// edge: a workflow runs as a single chain starting at the first declared step.
#[derive(Debug, Clone)]
pub struct Graph {
  /// step_id -> declared next steps, in declaration order.
  adjacency: HashMap<String, Vec<String>>,
  /// Step ids in declaration order.
  order: Vec<String>,
}

impl Graph {
  /// Build a graph from steps. Assumes ids are unique.
  pub fn new(steps: &[StepSpec]) -> Self {
    let adjacency = steps
      .iter()
      .map(|s| (s.id.clone(), s.next_steps.clone()))
      .collect();
    let order = steps.iter().map(|s| s.id.clone()).collect();
    Self { adjacency, order }
  }

  /// The first declared step, if any.
  pub fn entry_point(&self) -> Option<&str> {
    self.order.first().map(String::as_str)
  }

  /// The followed successor of a step, `None` for terminal steps.
  pub fn successor(&self, step_id: &str) -> Option<&str> {
    self.downstream(step_id).first().map(String::as_str)
  }

  /// All declared successors of a step.
  pub fn downstream(&self, step_id: &str) -> &[String] {
    self
      .adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn contains(&self, step_id: &str) -> bool {
    self.adjacency.contains_key(step_id)
  }

  /// Steps that declare more than one successor.
  pub fn branching_steps(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter(|id| self.downstream(id).len() > 1)
      .map(String::as_str)
      .collect()
  }

  /// Walk the chain from the entry point until a terminal step.
  ///
  /// Revisiting a step means the chain loops back on itself.
  pub fn walk(&self) -> Result<Vec<String>, CompileError> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut current = self.entry_point();

    while let Some(step_id) = current {
      if !seen.insert(step_id) {
        let start = path.iter().position(|id| id == step_id).unwrap_or(0);
        let mut cycle: Vec<String> = path[start..].to_vec();
        cycle.push(step_id.to_string());
        return Err(CompileError::CycleDetected { path: cycle });
      }
      path.push(step_id.to_string());
      current = self.successor(step_id);
    }

    Ok(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain() -> Vec<StepSpec> {
    vec![
      StepSpec::new("search", "Passthrough").with_next("enrich"),
      StepSpec::new("enrich", "Passthrough").with_next("score"),
      StepSpec::new("score", "Scorer"),
    ]
  }

  #[test]
  fn test_entry_and_successors() {
    let graph = Graph::new(&chain());

    assert_eq!(graph.entry_point(), Some("search"));
    assert_eq!(graph.successor("search"), Some("enrich"));
    assert_eq!(graph.successor("score"), None);
    assert_eq!(graph.successor("missing"), None);
  }

  #[test]
  fn test_walk_follows_chain() {
    let graph = Graph::new(&chain());
    assert_eq!(graph.walk().unwrap(), vec!["search", "enrich", "score"]);
  }

  #[test]
  fn test_walk_uses_first_successor_only() {
    let steps = vec![
      StepSpec::new("a", "Passthrough").with_next("c").with_next("b"),
      StepSpec::new("b", "Passthrough"),
      StepSpec::new("c", "Passthrough"),
    ];
    let graph = Graph::new(&steps);

    assert_eq!(graph.walk().unwrap(), vec!["a", "c"]);
    assert_eq!(graph.branching_steps(), vec!["a"]);
    assert_eq!(graph.downstream("a"), ["c".to_string(), "b".to_string()]);
  }

  #[test]
  fn test_walk_detects_cycle() {
    let steps = vec![
      StepSpec::new("start", "Passthrough").with_next("a"),
      StepSpec::new("a", "Passthrough").with_next("b"),
      StepSpec::new("b", "Passthrough").with_next("a"),
    ];
    let err = Graph::new(&steps).walk().unwrap_err();

    assert_eq!(
      err,
      CompileError::CycleDetected {
        path: vec!["a".to_string(), "b".to_string(), "a".to_string()]
      }
    );
  }

  #[test]
  fn test_self_loop_is_cycle() {
    let steps = vec![StepSpec::new("a", "Passthrough").with_next("a")];
    assert!(matches!(
      Graph::new(&steps).walk(),
      Err(CompileError::CycleDetected { .. })
    ));
  }
}
