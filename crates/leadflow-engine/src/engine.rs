//! Sequential execution of a compiled plan.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use leadflow_config::{StepSpec, ToolSpec};
use leadflow_registry::{Capability, CapabilityRegistry, RegistryError, UnitRegistry, UnitSpec};
use leadflow_resolver::{resolve_bindings, substitute_env_value};
use leadflow_workflow::{Plan, RunState, StateError, StepOutput};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::context::ExecutionContext;
use crate::error::StepFailure;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};

type UnitSlot = Result<Box<dyn Capability>, StepFailure>;

/// The workflow execution engine.
///
/// Generic over the registry it builds units from and over `N:
/// ExecutionNotifier`. Use [`ExecutionEngine::new`] for an engine that
/// discards events, or [`ExecutionEngine::with_notifier`] to observe them.
///
/// The registry is only read, so one engine can serve any number of
/// sequential runs.
pub struct ExecutionEngine<R: CapabilityRegistry = UnitRegistry, N: ExecutionNotifier = NoopNotifier> {
  registry: R,
  notifier: N,
}

impl<R: CapabilityRegistry> ExecutionEngine<R, NoopNotifier> {
  pub fn new(registry: R) -> Self {
    Self::with_notifier(registry, NoopNotifier)
  }
}

impl<R: CapabilityRegistry, N: ExecutionNotifier> ExecutionEngine<R, N> {
  pub fn with_notifier(registry: R, notifier: N) -> Self {
    Self { registry, notifier }
  }

  pub fn registry(&self) -> &R {
    &self.registry
  }

  /// Run every step of `plan` in order and return the final state.
  ///
  /// `initial` carries results produced before this run; its run id, results,
  /// log and errors are kept. Step failures are recorded in the returned
  /// state and never stop the run.
  #[instrument(skip_all, fields(workflow = %plan.workflow_name, steps = plan.len()))]
  pub fn execute(
    &self,
    plan: &Plan,
    context: &ExecutionContext,
    initial: Option<RunState>,
  ) -> RunState {
    let mut state = initial.unwrap_or_default();
    state.begin();
    let run_id = state.run_id.clone();

    info!(run_id = %run_id, entry_point = %plan.entry_point, "run started");
    self.notifier.notify(ExecutionEvent::RunStarted {
      run_id: run_id.clone(),
      workflow: plan.workflow_name.clone(),
      steps: plan.len(),
    });

    let mut units = self.instantiate_units(plan, context);

    for step in plan.steps() {
      state.enter_step(&step.id);
      self.notifier.notify(ExecutionEvent::StepStarted {
        run_id: run_id.clone(),
        step_id: step.id.clone(),
        unit_type: step.unit_type.clone(),
      });

      let started = Instant::now();
      let outcome = match units.remove(&step.id) {
        Some(unit) => self.run_step(step, unit, &state, context),
        None => Err(StepFailure::UnknownUnitType {
          step_id: step.id.clone(),
          unit_type: step.unit_type.clone(),
        }),
      };
      let elapsed = started.elapsed();

      let outcome = outcome.and_then(|output| {
        let data = Value::Object(output.clone());
        state
          .record_success(&step.id, output, elapsed)
          .map(|()| data)
          .map_err(|e| match e {
            StateError::DuplicateResult { step_id } => StepFailure::DuplicateResult { step_id },
            other => StepFailure::UnitFailed {
              step_id: step.id.clone(),
              message: other.to_string(),
            },
          })
      });

      match outcome {
        Ok(data) => {
          info!(
            run_id = %run_id,
            step_id = %step.id,
            duration_ms = millis(elapsed),
            "step completed"
          );
          self.notifier.notify(ExecutionEvent::StepCompleted {
            run_id: run_id.clone(),
            step_id: step.id.clone(),
            duration_ms: millis(elapsed),
            data,
          });
        }
        Err(failure) => {
          error!(
            run_id = %run_id,
            step_id = %step.id,
            unit_type = %step.unit_type,
            error = %failure,
            "step failed"
          );
          state.record_failure(&step.id, failure.to_string(), elapsed);
          self.notifier.notify(ExecutionEvent::StepFailed {
            run_id: run_id.clone(),
            step_id: step.id.clone(),
            duration_ms: millis(elapsed),
            error: failure.to_string(),
          });
        }
      }
    }

    state.finish();

    let summary = state.summary();
    info!(
      run_id = %run_id,
      steps_executed = summary.steps_executed,
      errors = summary.error_count,
      duration = ?summary.duration,
      "run completed"
    );
    self.notifier.notify(ExecutionEvent::RunCompleted {
      run_id,
      succeeded: summary.steps_succeeded,
      failed: summary.steps_executed - summary.steps_succeeded,
    });

    state
  }

  /// Build every step's unit up front. Failures are kept per step and only
  /// surface when that step is reached.
  fn instantiate_units(&self, plan: &Plan, context: &ExecutionContext) -> HashMap<String, UnitSlot> {
    plan
      .steps()
      .iter()
      .map(|step| {
        let spec = UnitSpec::from_step(step).with_tools(substitute_tools(&step.tools, context));
        let unit = match catch_unwind(AssertUnwindSafe(|| self.registry.instantiate(&spec))) {
          Ok(built) => built.map_err(|e| construction_failure(step, e)),
          Err(payload) => Err(StepFailure::UnitConstruction {
            step_id: step.id.clone(),
            unit_type: step.unit_type.clone(),
            message: format!("factory panicked: {}", panic_message(payload.as_ref())),
          }),
        };
        if let Err(e) = &unit {
          warn!(step_id = %e.step_id(), error = %e, "unit unavailable");
        }
        (step.id.clone(), unit)
      })
      .collect()
  }

  fn run_step(
    &self,
    step: &StepSpec,
    unit: UnitSlot,
    state: &RunState,
    context: &ExecutionContext,
  ) -> Result<StepOutput, StepFailure> {
    if state.has_result(&step.id) {
      return Err(StepFailure::DuplicateResult {
        step_id: step.id.clone(),
      });
    }
    let unit = unit?;

    let input = resolve_bindings(&step.input_bindings, state, &context.scope());
    debug!(step_id = %step.id, inputs = input.len(), "resolved step input");

    let output = match catch_unwind(AssertUnwindSafe(|| unit.execute(&input))) {
      Ok(Ok(output)) => output,
      Ok(Err(e)) => {
        return Err(StepFailure::UnitFailed {
          step_id: step.id.clone(),
          message: e.to_string(),
        });
      }
      Err(payload) => {
        return Err(StepFailure::UnitPanicked {
          step_id: step.id.clone(),
          message: panic_message(payload.as_ref()),
        });
      }
    };

    let missing: Vec<String> = step
      .output_contract
      .keys()
      .filter(|key| !output.contains_key(key.as_str()))
      .cloned()
      .collect();
    if !missing.is_empty() {
      return Err(StepFailure::ContractViolation {
        step_id: step.id.clone(),
        missing,
      });
    }

    Ok(output)
  }
}

fn substitute_tools(tools: &[ToolSpec], context: &ExecutionContext) -> Vec<ToolSpec> {
  tools
    .iter()
    .map(|tool| ToolSpec {
      name: tool.name.clone(),
      config: tool
        .config
        .iter()
        .map(|(k, v)| (k.clone(), substitute_env_value(v, &context.env)))
        .collect(),
    })
    .collect()
}

fn construction_failure(step: &StepSpec, error: RegistryError) -> StepFailure {
  match error {
    RegistryError::UnknownUnitType { unit_type } => StepFailure::UnknownUnitType {
      step_id: step.id.clone(),
      unit_type,
    },
    RegistryError::Construction { unit_type, message } => StepFailure::UnitConstruction {
      step_id: step.id.clone(),
      unit_type,
      message,
    },
    other => StepFailure::UnitConstruction {
      step_id: step.id.clone(),
      unit_type: step.unit_type.clone(),
      message: other.to_string(),
    },
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}

fn millis(elapsed: Duration) -> u64 {
  u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
