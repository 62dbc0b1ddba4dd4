use std::collections::HashSet;
use std::fmt;

use leadflow_config::{RESERVED_STEP_IDS, Reference, StepSpec, WorkflowSpec};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::CompileError;
use crate::graph::Graph;

/// An ordered, validated sequence of steps ready for execution.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
  pub workflow_name: String,
  /// Id of the first step to run.
  pub entry_point: String,
  steps: Vec<StepSpec>,
  warnings: Vec<CompileWarning>,
}

impl Plan {
  pub fn steps(&self) -> &[StepSpec] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn step(&self, step_id: &str) -> Option<&StepSpec> {
    self.steps.iter().find(|s| s.id == step_id)
  }

  pub fn step_ids(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.id.as_str()).collect()
  }

  pub fn warnings(&self) -> &[CompileWarning] {
    &self.warnings
  }
}

/// Findings that do not prevent compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileWarning {
  /// More than one successor declared; only the first is followed.
  MultipleSuccessors {
    step_id: String,
    followed: String,
    ignored: Vec<String>,
  },
  /// Step not reachable from the entry point; excluded from the plan.
  UnreachableStep { step_id: String },
  /// A binding reads from a step id that does not exist in the workflow.
  UnknownReference {
    step_id: String,
    input: String,
    referenced: String,
  },
}

impl fmt::Display for CompileWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CompileWarning::MultipleSuccessors {
        step_id,
        followed,
        ignored,
      } => write!(
        f,
        "step '{}' declares {} next steps; following '{}', ignoring {:?}",
        step_id,
        ignored.len() + 1,
        followed,
        ignored
      ),
      CompileWarning::UnreachableStep { step_id } => {
        write!(f, "step '{}' is unreachable from the entry point", step_id)
      }
      CompileWarning::UnknownReference {
        step_id,
        input,
        referenced,
      } => write!(
        f,
        "input '{}' of step '{}' references unknown step '{}'",
        input, step_id, referenced
      ),
    }
  }
}

/// Compile a workflow specification into an execution plan.
///
/// Fails on an empty step list, missing or duplicate ids, reserved ids,
/// successors that do not exist, and cycles along the followed chain.
#[instrument(skip(spec), fields(workflow = %spec.name, steps = spec.steps.len()))]
pub fn compile(spec: &WorkflowSpec) -> Result<Plan, CompileError> {
  if spec.steps.is_empty() {
    return Err(CompileError::EmptyWorkflow);
  }

  validate_steps(&spec.steps)?;

  let graph = Graph::new(&spec.steps);
  validate_successors(&spec.steps, &graph)?;

  let mut warnings = Vec::new();
  for step_id in graph.branching_steps() {
    if let [followed, ignored @ ..] = graph.downstream(step_id) {
      warnings.push(CompileWarning::MultipleSuccessors {
        step_id: step_id.to_string(),
        followed: followed.clone(),
        ignored: ignored.to_vec(),
      });
    }
  }

  let order = graph.walk()?;
  let reachable: HashSet<&str> = order.iter().map(String::as_str).collect();

  for step in &spec.steps {
    if !reachable.contains(step.id.as_str()) {
      warnings.push(CompileWarning::UnreachableStep {
        step_id: step.id.clone(),
      });
    }
  }

  for step in &spec.steps {
    for (input, binding) in &step.input_bindings {
      for referenced in referenced_steps(binding) {
        if !graph.contains(&referenced) {
          warnings.push(CompileWarning::UnknownReference {
            step_id: step.id.clone(),
            input: input.clone(),
            referenced,
          });
        }
      }
    }
  }

  for warning in &warnings {
    warn!(workflow = %spec.name, "{}", warning);
  }

  let steps: Vec<StepSpec> = order
    .iter()
    .filter_map(|id| spec.step(id).cloned())
    .collect();

  info!(
    workflow = %spec.name,
    plan_length = steps.len(),
    warnings = warnings.len(),
    "workflow compiled"
  );

  Ok(Plan {
    workflow_name: spec.name.clone(),
    entry_point: order[0].clone(),
    steps,
    warnings,
  })
}

fn validate_steps(steps: &[StepSpec]) -> Result<(), CompileError> {
  let mut seen = HashSet::new();

  for (index, step) in steps.iter().enumerate() {
    if step.id.is_empty() {
      return Err(CompileError::MissingField { index, field: "id" });
    }
    if step.unit_type.is_empty() {
      return Err(CompileError::MissingField {
        index,
        field: "unit_type",
      });
    }
    if RESERVED_STEP_IDS.contains(&step.id.as_str()) {
      return Err(CompileError::ReservedStepId {
        step_id: step.id.clone(),
      });
    }
    if !seen.insert(step.id.as_str()) {
      return Err(CompileError::DuplicateStepId {
        step_id: step.id.clone(),
      });
    }
  }

  Ok(())
}

fn validate_successors(steps: &[StepSpec], graph: &Graph) -> Result<(), CompileError> {
  for step in steps {
    for next_step in &step.next_steps {
      if !graph.contains(next_step) {
        return Err(CompileError::UnknownSuccessor {
          step_id: step.id.clone(),
          next_step: next_step.clone(),
        });
      }
    }
  }
  Ok(())
}

/// Step ids referenced by placeholders anywhere inside a binding value.
fn referenced_steps(binding: &Value) -> Vec<String> {
  match binding {
    Value::String(s) => Reference::parse(s)
      .and_then(|r| r.step_id())
      .map(|id| vec![id.to_string()])
      .unwrap_or_default(),
    Value::Array(items) => items.iter().flat_map(referenced_steps).collect(),
    Value::Object(map) => map.values().flat_map(referenced_steps).collect(),
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn spec(steps: Vec<StepSpec>) -> WorkflowSpec {
    WorkflowSpec::new("test", steps)
  }

  #[test]
  fn test_compile_linear_chain() {
    let plan = compile(&spec(vec![
      StepSpec::new("search", "Passthrough").with_next("enrich"),
      StepSpec::new("enrich", "Passthrough").with_next("score"),
      StepSpec::new("score", "Scorer"),
    ]))
    .unwrap();

    assert_eq!(plan.entry_point, "search");
    assert_eq!(plan.step_ids(), vec!["search", "enrich", "score"]);
    assert!(plan.warnings().is_empty());
  }

  #[test]
  fn test_order_follows_edges_not_declaration() {
    let plan = compile(&spec(vec![
      StepSpec::new("first", "Passthrough").with_next("third"),
      StepSpec::new("second", "Passthrough"),
      StepSpec::new("third", "Passthrough").with_next("second"),
    ]))
    .unwrap();

    assert_eq!(plan.step_ids(), vec!["first", "third", "second"]);
  }

  #[test]
  fn test_single_step() {
    let plan = compile(&spec(vec![StepSpec::new("score", "Scorer")])).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.step("score").unwrap().unit_type, "Scorer");
  }

  #[test]
  fn test_empty_workflow() {
    assert_eq!(compile(&spec(vec![])).unwrap_err(), CompileError::EmptyWorkflow);
  }

  #[test]
  fn test_duplicate_id() {
    let err = compile(&spec(vec![
      StepSpec::new("a", "Passthrough").with_next("a2"),
      StepSpec::new("a2", "Passthrough"),
      StepSpec::new("a", "Passthrough"),
    ]))
    .unwrap_err();

    assert_eq!(
      err,
      CompileError::DuplicateStepId {
        step_id: "a".to_string()
      }
    );
  }

  #[test]
  fn test_unknown_successor() {
    let err = compile(&spec(vec![
      StepSpec::new("a", "Passthrough").with_next("b"),
      StepSpec::new("b", "Passthrough").with_next("missing"),
    ]))
    .unwrap_err();

    assert_eq!(
      err,
      CompileError::UnknownSuccessor {
        step_id: "b".to_string(),
        next_step: "missing".to_string()
      }
    );
  }

  #[test]
  fn test_ignored_successor_must_still_exist() {
    let err = compile(&spec(vec![
      StepSpec::new("a", "Passthrough")
        .with_next("b")
        .with_next("ghost"),
      StepSpec::new("b", "Passthrough"),
    ]))
    .unwrap_err();

    assert!(matches!(err, CompileError::UnknownSuccessor { .. }));
  }

  #[test]
  fn test_cycle_rejected() {
    let err = compile(&spec(vec![
      StepSpec::new("a", "Passthrough").with_next("b"),
      StepSpec::new("b", "Passthrough").with_next("a"),
    ]))
    .unwrap_err();

    assert_eq!(err.to_string(), "cycle detected in workflow: a -> b -> a");
  }

  #[test]
  fn test_missing_fields() {
    let err = compile(&spec(vec![StepSpec::new("", "Passthrough")])).unwrap_err();
    assert_eq!(err, CompileError::MissingField { index: 0, field: "id" });

    let err = compile(&spec(vec![
      StepSpec::new("a", "Passthrough"),
      StepSpec::new("b", ""),
    ]))
    .unwrap_err();
    assert_eq!(
      err,
      CompileError::MissingField {
        index: 1,
        field: "unit_type"
      }
    );
  }

  #[test]
  fn test_reserved_ids() {
    let err = compile(&spec(vec![StepSpec::new("config", "Passthrough")])).unwrap_err();
    assert!(matches!(err, CompileError::ReservedStepId { .. }));

    let err = compile(&spec(vec![StepSpec::new("env", "Passthrough")])).unwrap_err();
    assert!(matches!(err, CompileError::ReservedStepId { .. }));
  }

  #[test]
  fn test_unreachable_steps_are_excluded() {
    let plan = compile(&spec(vec![
      StepSpec::new("a", "Passthrough").with_next("b"),
      StepSpec::new("b", "Passthrough"),
      StepSpec::new("orphan", "Passthrough"),
    ]))
    .unwrap();

    assert_eq!(plan.step_ids(), vec!["a", "b"]);
    assert_eq!(
      plan.warnings(),
      &[CompileWarning::UnreachableStep {
        step_id: "orphan".to_string()
      }]
    );
  }

  #[test]
  fn test_multiple_successors_warns() {
    let plan = compile(&spec(vec![
      StepSpec::new("a", "Passthrough").with_next("b").with_next("c"),
      StepSpec::new("b", "Passthrough"),
      StepSpec::new("c", "Passthrough"),
    ]))
    .unwrap();

    assert_eq!(plan.step_ids(), vec!["a", "b"]);
    assert!(plan.warnings().contains(&CompileWarning::MultipleSuccessors {
      step_id: "a".to_string(),
      followed: "b".to_string(),
      ignored: vec!["c".to_string()],
    }));
    assert!(plan.warnings().contains(&CompileWarning::UnreachableStep {
      step_id: "c".to_string()
    }));
  }

  #[test]
  fn test_unknown_reference_warns() {
    let plan = compile(&spec(vec![
      StepSpec::new("a", "Passthrough").with_next("b"),
      StepSpec::new("b", "Passthrough")
        .with_binding("leads", "{{serch.leads}}")
        .with_binding("nested", json!({ "inner": ["{{a}}", "{{ghost}}"] }))
        .with_binding("criteria", "{{config.scoring}}"),
    ]))
    .unwrap();

    let unknown: Vec<&CompileWarning> = plan
      .warnings()
      .iter()
      .filter(|w| matches!(w, CompileWarning::UnknownReference { .. }))
      .collect();
    assert_eq!(unknown.len(), 2);
    assert_eq!(
      unknown[0].to_string(),
      "input 'leads' of step 'b' references unknown step 'serch'"
    );
  }

  #[test]
  fn test_plan_length_bounded_by_step_count() {
    let steps: Vec<StepSpec> = (0..5)
      .map(|i| {
        let step = StepSpec::new(format!("s{}", i), "Passthrough");
        if i < 2 {
          step.with_next(format!("s{}", i + 1))
        } else {
          step
        }
      })
      .collect();
    let plan = compile(&spec(steps)).unwrap();

    assert!(!plan.is_empty());
    assert!(plan.len() <= 5);
    assert_eq!(plan.len(), 3);
  }
}
