use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trellis_config::FlowDef;
use trellis_flow::Flow;
use trellis_tasks::builtin_registry;
use trellis_trigger::TriggerRegistry;

/// Trellis - a task-graph workflow engine
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.trellis)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Log filter used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a flow once and print its execution report
  Run {
    /// Flow file, or the name of a flow in <data-dir>/flows
    flow: String,

    /// Start input as JSON (read from stdin when omitted)
    #[arg(long)]
    input: Option<String>,
  },

  /// Print a flow's task layers
  Sequence {
    /// Flow file, or the name of a flow in <data-dir>/flows
    flow: String,
  },

  /// Check a flow for unreachable tasks
  Validate {
    /// Flow file, or the name of a flow in <data-dir>/flows
    flow: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
    )
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".trellis"),
  };

  match cli.command {
    Some(Commands::Run { flow, input }) => run(&data_dir, &flow, input).await?,
    Some(Commands::Sequence { flow }) => sequence(&data_dir, &flow)?,
    Some(Commands::Validate { flow }) => validate(&data_dir, &flow)?,
    None => {
      println!("trellis - use --help to see available commands");
    }
  }

  Ok(())
}

async fn run(data_dir: &Path, flow: &str, input: Option<String>) -> Result<()> {
  let flow = load_flow(data_dir, flow)?;

  let payload = match input {
    Some(input) => serde_json::from_str(&input).context("failed to parse --input as JSON")?,
    None => read_payload_from_stdin()?,
  };

  let mut execution = flow.create_execution();
  let outcome = execution.start(payload).await;
  let report = execution.report();

  info!(
    execution_id = %report.execution_id,
    tasks_run = report.logs.len(),
    errors = report.error_count(),
    "execution finished"
  );
  println!("{}", serde_json::to_string_pretty(&report)?);

  outcome.context("flow execution aborted")?;
  Ok(())
}

fn sequence(data_dir: &Path, flow: &str) -> Result<()> {
  let flow = load_flow(data_dir, flow)?;
  println!("{}", serde_json::to_string_pretty(&flow.sequence_names())?);
  Ok(())
}

fn validate(data_dir: &Path, flow: &str) -> Result<()> {
  let flow = load_flow(data_dir, flow)?;
  let warnings = flow.validate();

  if warnings.is_empty() {
    println!("{}: ok", flow.name());
    return Ok(());
  }

  for warning in &warnings {
    println!("{}: {}", flow.name(), warning);
  }
  bail!("{} warning(s) found", warnings.len())
}

/// Resolve a flow argument: an existing file, or `<data-dir>/flows/<name>.json`.
fn flow_path(data_dir: &Path, flow: &str) -> PathBuf {
  let path = PathBuf::from(flow);
  if path.exists() {
    return path;
  }
  data_dir.join("flows").join(format!("{}.json", flow))
}

fn load_flow(data_dir: &Path, flow: &str) -> Result<Flow> {
  let path = flow_path(data_dir, flow);

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read flow file: {}", path.display()))?;
  let def: FlowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse flow file: {}", path.display()))?;

  let name = path
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or(flow)
    .to_string();

  let flow = Flow::from_def(name, &def, &builtin_registry(), &TriggerRegistry::with_builtin())
    .with_context(|| format!("invalid flow: {}", path.display()))?;

  info!(
    flow = %flow.name(),
    tasks = flow.tasks().len(),
    connections = flow.connections().len(),
    "loaded flow"
  );
  Ok(flow)
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(serde_json::json!({}));
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read payload from stdin")?;

  if input.trim().is_empty() {
    Ok(serde_json::json!({}))
  } else {
    serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
  }
}
