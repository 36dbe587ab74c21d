use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error, info, trace, warn};
use trellis_task::{Inputs, ParamKind, ParamSchema, Params, TaskError, TaskKind};

/// Emits `message` as a tracing event at `level` (default `info`).
pub struct Log {
  schema: ParamSchema,
}

impl Log {
  pub fn new() -> Self {
    Self {
      schema: ParamSchema::new()
        .required("message", ParamKind::String)
        .optional("level", ParamKind::String),
    }
  }
}

impl Default for Log {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl TaskKind for Log {
  fn type_name(&self) -> &str {
    "log"
  }

  fn schema(&self) -> Option<&ParamSchema> {
    Some(&self.schema)
  }

  async fn execute(&self, params: &Params, _inputs: &Inputs) -> Result<Value, TaskError> {
    let message = params
      .get("message")
      .and_then(Value::as_str)
      .unwrap_or_default();
    let level = params
      .get("level")
      .and_then(Value::as_str)
      .unwrap_or("info");

    match level {
      "trace" => trace!(target: "trellis::log", "{}", message),
      "debug" => debug!(target: "trellis::log", "{}", message),
      "info" => info!(target: "trellis::log", "{}", message),
      "warn" => warn!(target: "trellis::log", "{}", message),
      "error" => error!(target: "trellis::log", "{}", message),
      other => {
        return Err(TaskError::execution(format!(
          "unknown log level '{}', expected trace, debug, info, warn or error",
          other
        )));
      }
    }

    Ok(json!({ "message": message }))
  }
}
