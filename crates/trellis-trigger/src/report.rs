//! Execution reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trellis_task::TaskResult;

/// One completed task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
  pub task: String,
  pub end: DateTime<Utc>,
  pub result: TaskResult,
}

/// Owned snapshot of a finished execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
  pub execution_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub started_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub finished_at: Option<DateTime<Utc>>,
  pub logs: Vec<LogRecord>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response: Option<serde_json::Value>,
  /// Message of the fatal error that aborted the run, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fatal: Option<String>,
}

impl ExecutionReport {
  /// Log records of failed task invocations.
  pub fn errors(&self) -> impl Iterator<Item = &LogRecord> {
    self.logs.iter().filter(|r| !r.result.success)
  }

  pub fn has_errors(&self) -> bool {
    self.errors().next().is_some()
  }

  pub fn error_count(&self) -> usize {
    self.errors().count()
  }

  /// True if any task failed or the run was aborted.
  pub fn failed(&self) -> bool {
    self.fatal.is_some() || self.has_errors()
  }

  /// Error messages: the fatal error first, then each failed task.
  pub fn error_messages(&self) -> Vec<String> {
    self
      .fatal
      .iter()
      .cloned()
      .chain(self.errors().map(|r| {
        let message = r
          .result
          .error
          .as_ref()
          .map(|e| e.message.as_str())
          .unwrap_or("task failed");
        format!("{}: {}", r.task, message)
      }))
      .collect()
  }
}
