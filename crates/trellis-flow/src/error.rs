//! Flow and execution errors.

use thiserror::Error;
use trellis_task::TaskError;
use trellis_trigger::TriggerError;

/// Errors raised while defining a flow. Always fatal, never retried.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("task '{name}' already exists in flow")]
  DuplicateTask { name: String },

  #[error("task '{name}' not found in flow")]
  UnknownTask { name: String },

  #[error("connection '{id}' not found in flow")]
  UnknownConnection { id: String },

  #[error("connection id '{id}' is already in use")]
  DuplicateConnectionId { id: String },

  #[error("connection {source_task} -> {target} with the same condition already exists")]
  DuplicateConnection { source_task: String, target: String },

  #[error(
    "ambiguous back-edge {source_task} -> {target}: '{source_task}' already has a back-edge with the same condition"
  )]
  AmbiguousBackEdge { source_task: String, target: String },

  #[error("invalid flow definition: {message}")]
  InvalidDefinition { message: String },

  #[error(transparent)]
  Task(#[from] TaskError),

  #[error(transparent)]
  Trigger(#[from] TriggerError),
}

/// Errors that abort a whole execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
  #[error("task '{task}' exceeded its retry limit: {runs} successful runs, max retries {max_retries}")]
  RetryLimitExceeded {
    task: String,
    runs: usize,
    max_retries: u32,
  },

  #[error("execution has already been started")]
  AlreadyStarted,
}
