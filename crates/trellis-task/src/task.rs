//! Tasks and task kinds.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument, warn};
use trellis_config::TaskDef;

use crate::error::TaskError;
use crate::result::{ErrorInfo, Inputs, TaskResult};
use crate::schema::ParamSchema;
use crate::template::resolve_params;

/// Task parameters, keyed by parameter name.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Behaviour shared by every task of one type.
///
/// Implementations are stateless with respect to a run: everything a single
/// invocation needs arrives through `execute`. Failures are reported by
/// returning an error; [`Task::run`] turns them into a failed [`TaskResult`].
#[async_trait]
pub trait TaskKind: Send + Sync {
  /// Registry type tag, e.g. `"fetch"`.
  fn type_name(&self) -> &str;

  /// Parameter schema. `None` means the kind takes no parameters.
  fn schema(&self) -> Option<&ParamSchema>;

  /// Run the task with fully resolved parameters.
  async fn execute(&self, params: &Params, inputs: &Inputs) -> Result<serde_json::Value, TaskError>;
}

/// A named task: a [`TaskKind`] plus declared parameters.
#[derive(Clone)]
pub struct Task {
  name: String,
  params: Params,
  kind: Arc<dyn TaskKind>,
}

impl fmt::Debug for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Task")
      .field("name", &self.name)
      .field("type", &self.kind.type_name())
      .field("params", &self.params)
      .finish()
  }
}

impl Task {
  /// Create a task, validating `params` against the kind's schema.
  pub fn new(
    name: impl Into<String>,
    kind: impl TaskKind + 'static,
    params: Params,
  ) -> Result<Self, TaskError> {
    Self::from_kind(name, Arc::new(kind), params)
  }

  /// Create a task from a shared kind.
  pub fn from_kind(
    name: impl Into<String>,
    kind: Arc<dyn TaskKind>,
    params: Params,
  ) -> Result<Self, TaskError> {
    let name = name.into();
    if name.is_empty() {
      return Err(TaskError::EmptyName);
    }

    let params = match kind.schema() {
      Some(schema) => schema.validate(&name, &params)?,
      None if params.is_empty() => params,
      None => return Err(TaskError::UnexpectedParams { task: name }),
    };

    Ok(Self { name, params, kind })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn type_name(&self) -> &str {
    self.kind.type_name()
  }

  /// Declared parameters, as decoded by the schema. Template strings are
  /// kept verbatim.
  pub fn params(&self) -> &Params {
    &self.params
  }

  pub fn schema(&self) -> Option<&ParamSchema> {
    self.kind.schema()
  }

  /// Create a task of the same kind with a different name and parameters.
  pub fn clone_with(&self, name: impl Into<String>, params: Params) -> Result<Self, TaskError> {
    Self::from_kind(name, self.kind.clone(), params)
  }

  /// Clone this task with its parameters resolved against `inputs`.
  pub fn resolve(&self, inputs: &Inputs) -> Result<Self, TaskError> {
    let resolved = resolve_params(&self.name, self.schema(), &self.params, inputs)?;
    Ok(Self {
      name: self.name.clone(),
      params: resolved,
      kind: self.kind.clone(),
    })
  }

  /// Execute with the currently held parameters.
  pub async fn execute(&self, inputs: &Inputs) -> Result<serde_json::Value, TaskError> {
    self.kind.execute(&self.params, inputs).await
  }

  /// Resolve, execute and package the outcome. Never fails: errors are
  /// captured into the returned result.
  #[instrument(
    name = "task_run",
    skip(self, inputs),
    fields(task = %self.name, task_type = %self.kind.type_name())
  )]
  pub async fn run(&self, inputs: &Inputs) -> TaskResult {
    let start = Utc::now();
    let timer = Instant::now();

    let (params, outcome) = match self.resolve(inputs) {
      Ok(resolved) => {
        debug!(params = ?resolved.params, "params resolved");
        let outcome = resolved.execute(inputs).await;
        (resolved.params, outcome)
      }
      Err(e) => (self.params.clone(), Err(e)),
    };

    let duration_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
      Ok(output) => TaskResult {
        start,
        output: Some(output),
        error: None,
        success: true,
        params,
        duration_ms,
      },
      Err(e) => {
        warn!(error = %e, "task returned an error");
        TaskResult {
          start,
          output: None,
          error: Some(ErrorInfo::from(&e)),
          success: false,
          params,
          duration_ms,
        }
      }
    }
  }

  /// Serialized form of this task.
  pub fn to_def(&self) -> TaskDef {
    TaskDef {
      task_type: self.kind.type_name().to_string(),
      params: self.params.clone(),
    }
  }
}
