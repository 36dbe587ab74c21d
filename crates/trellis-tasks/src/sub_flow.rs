use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use trellis_flow::Flow;
use trellis_task::{Inputs, ParamKind, ParamSchema, Params, TaskError, TaskKind};
use trellis_trigger::FlowRunner;

/// Runs another flow to completion and outputs its response.
///
/// The task fails if any task of the sub-flow failed or the sub-flow was
/// aborted.
pub struct SubFlow {
  type_name: String,
  flow: Arc<Flow>,
  schema: ParamSchema,
}

impl SubFlow {
  /// Wrap `flow` under the `sub-flow` type tag.
  pub fn new(flow: Arc<Flow>) -> Self {
    Self::with_type("sub-flow", flow)
  }

  /// Wrap `flow` under a custom type tag, so several sub-flows can share one
  /// registry.
  pub fn with_type(type_name: impl Into<String>, flow: Arc<Flow>) -> Self {
    Self {
      type_name: type_name.into(),
      flow,
      schema: ParamSchema::new().optional("input", ParamKind::Any),
    }
  }

  pub fn flow(&self) -> &Arc<Flow> {
    &self.flow
  }
}

#[async_trait]
impl TaskKind for SubFlow {
  fn type_name(&self) -> &str {
    &self.type_name
  }

  fn schema(&self) -> Option<&ParamSchema> {
    Some(&self.schema)
  }

  async fn execute(&self, params: &Params, _inputs: &Inputs) -> Result<Value, TaskError> {
    let input = params.get("input").cloned().unwrap_or(Value::Null);
    let report = self.flow.run(input).await;

    info!(
      flow = %self.flow.name(),
      execution_id = %report.execution_id,
      tasks_run = report.logs.len(),
      "sub-flow finished"
    );

    if report.failed() {
      return Err(TaskError::execution(format!(
        "sub-flow '{}' failed: {}",
        self.flow.name(),
        report.error_messages().join("; ")
      )));
    }

    Ok(report.response.unwrap_or(Value::Null))
  }
}
