use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadflow_config::{WorkflowSpec, parse_criteria};
use leadflow_engine::{ChannelNotifier, ExecutionContext, ExecutionEngine, ExecutionEvent};
use leadflow_registry::UnitRegistry;
use leadflow_workflow::{RunState, compile};

/// Leadflow - runs declarative outbound sales pipelines
#[derive(Parser)]
#[command(name = "leadflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Set a variable visible to `{{env.NAME}}` placeholders and tool config (KEY=VALUE)
  #[arg(long = "var", global = true, value_parser = parse_var)]
  vars: Vec<(String, String)>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a workflow and print the final run state
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Results to seed the run with, as a mapping of step id to payload.
    /// Read from stdin when omitted and stdin is piped.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the run state to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
  },

  /// Compile a workflow and print its plan and warnings
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Print a workflow's name, steps and configuration
  Summary {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Score a list of lead records
  Score {
    /// Path to a JSON sequence of records
    records_file: PathBuf,

    /// Path to criteria, either a sequence or `{ "criteria": [...] }`
    #[arg(long)]
    criteria: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      input,
      output,
    }) => run_workflow(workflow_file, input, output, cli.vars)?,
    Some(Commands::Validate { workflow_file }) => validate_workflow(&workflow_file)?,
    Some(Commands::Summary { workflow_file }) => summarize_workflow(&workflow_file)?,
    Some(Commands::Score {
      records_file,
      criteria,
    }) => score_records(&records_file, criteria.as_deref())?,
    None => {
      println!("leadflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn run_workflow(
  workflow_file: PathBuf,
  input: Option<PathBuf>,
  output: Option<PathBuf>,
  vars: Vec<(String, String)>,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, input, output, vars).await })
}

async fn run_workflow_async(
  workflow_file: PathBuf,
  input: Option<PathBuf>,
  output: Option<PathBuf>,
  vars: Vec<(String, String)>,
) -> Result<()> {
  let spec = load_workflow(&workflow_file)?;
  let plan = compile(&spec).context("failed to compile workflow")?;
  eprintln!("Loaded workflow: {} ({} steps planned)", spec.name, plan.len());

  let seed = match input {
    Some(path) => Some(read_json(&path)?),
    None => read_seed_from_stdin()?,
  };
  let initial = match seed {
    Some(Value::Object(results)) => {
      Some(RunState::seeded(results).context("invalid seed results")?)
    }
    Some(_) => bail!("seed results must be a mapping of step id to payload"),
    None => None,
  };

  let mut context = ExecutionContext::new(spec.config.clone()).with_env(std::env::vars());
  for (name, value) in vars {
    context.set_var(name, value);
  }

  let (notifier, mut events) = ChannelNotifier::channel();
  let engine = ExecutionEngine::with_notifier(builtin_registry()?, notifier);
  info!(unit_types = ?engine.registry().unit_types(), "units available");

  let progress = tokio::spawn(async move {
    while let Some(event) = events.recv().await {
      report_progress(&event);
    }
  });

  // Units block, so the run happens off the async workers.
  let state = tokio::task::spawn_blocking(move || engine.execute(&plan, &context, initial))
    .await
    .context("workflow execution panicked")?;
  progress.await.context("progress reporter failed")?;

  let summary = state.summary();
  info!(
    run_id = %summary.run_id,
    steps_executed = summary.steps_executed,
    errors = summary.error_count,
    "run finished"
  );

  let rendered = serde_json::to_string_pretty(&state)?;
  match output {
    Some(path) => {
      tokio::fs::write(&path, rendered)
        .await
        .with_context(|| format!("failed to write run state: {}", path.display()))?;
      eprintln!("Run state written to {}", path.display());
    }
    None => println!("{}", rendered),
  }

  Ok(())
}

fn validate_workflow(workflow_file: &Path) -> Result<()> {
  let spec = load_workflow(workflow_file)?;
  let plan = compile(&spec).context("failed to compile workflow")?;

  for warning in plan.warnings() {
    eprintln!("warning: {}", warning);
  }
  println!("{}", serde_json::to_string_pretty(&plan)?);
  Ok(())
}

fn summarize_workflow(workflow_file: &Path) -> Result<()> {
  let spec = load_workflow(workflow_file)?;
  println!("{}", serde_json::to_string_pretty(&spec.summary())?);
  Ok(())
}

fn score_records(records_file: &Path, criteria_file: Option<&Path>) -> Result<()> {
  let records = match read_json(records_file)? {
    Value::Array(records) => records,
    _ => bail!("records file must contain a JSON sequence"),
  };
  let criteria = match criteria_file {
    Some(path) => parse_criteria(&read_json(path)?)
      .with_context(|| format!("invalid criteria file: {}", path.display()))?,
    None => Vec::new(),
  };

  let scored = leadflow_scoring::score(&records, &criteria);
  println!("{}", serde_json::to_string_pretty(&scored)?);
  Ok(())
}

fn builtin_registry() -> Result<UnitRegistry> {
  let mut registry = UnitRegistry::with_builtins();
  leadflow_scoring::register(&mut registry).context("failed to register scoring unit")?;
  Ok(registry)
}

fn load_workflow(path: &Path) -> Result<WorkflowSpec> {
  WorkflowSpec::load(path).with_context(|| format!("failed to load workflow file: {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read file: {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}

fn read_seed_from_stdin() -> Result<Option<Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(None);
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read seed results from stdin")?;

  if input.trim().is_empty() {
    Ok(None)
  } else {
    serde_json::from_str(&input)
      .map(Some)
      .context("failed to parse seed results JSON from stdin")
  }
}

fn report_progress(event: &ExecutionEvent) {
  match event {
    ExecutionEvent::RunStarted { run_id, steps, .. } => {
      eprintln!("Run {} started ({} steps)", run_id, steps);
    }
    ExecutionEvent::StepStarted {
      step_id, unit_type, ..
    } => eprintln!("  -> {} [{}]", step_id, unit_type),
    ExecutionEvent::StepCompleted {
      step_id,
      duration_ms,
      ..
    } => eprintln!("  ok {} ({} ms)", step_id, duration_ms),
    ExecutionEvent::StepFailed { step_id, error, .. } => {
      eprintln!("  failed {}: {}", step_id, error)
    }
    ExecutionEvent::RunCompleted {
      succeeded, failed, ..
    } => eprintln!("Run completed: {} succeeded, {} failed", succeeded, failed),
  }
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
  match raw.split_once('=') {
    Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
    _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
  }
}
