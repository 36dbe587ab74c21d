//! Task result types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::task::Params;

/// Outputs of completed tasks, keyed by task name. The external start input
/// is stored under `"flow"`.
pub type Inputs = HashMap<String, TaskResult>;

/// Serializable description of a task failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
  /// Failure class: `definition`, `params`, `template` or `execution`.
  pub kind: String,
  pub message: String,
}

impl From<&TaskError> for ErrorInfo {
  fn from(e: &TaskError) -> Self {
    Self {
      kind: e.kind().to_string(),
      message: e.to_string(),
    }
  }
}

/// Outcome of one task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
  /// Wall-clock start of the invocation.
  pub start: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<ErrorInfo>,
  pub success: bool,
  /// Parameters after template resolution (the declared ones if resolution failed).
  pub params: Params,
  pub duration_ms: u64,
}

impl TaskResult {
  /// Synthetic result holding the input a flow was started with.
  pub fn flow_input(input: serde_json::Value) -> Self {
    Self {
      start: Utc::now(),
      output: Some(input),
      error: None,
      success: true,
      params: Params::new(),
      duration_ms: 0,
    }
  }
}
