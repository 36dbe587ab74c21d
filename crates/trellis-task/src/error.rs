//! Task error types.

/// Errors raised while building or running a task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
  /// Task names must be non-empty.
  #[error("task name must not be empty")]
  EmptyName,

  /// Parameters were supplied to a task kind that declares no schema.
  #[error("task '{task}' takes no parameters")]
  UnexpectedParams { task: String },

  /// Parameter not declared in the schema.
  #[error("task '{task}' has unknown parameter '{param}'")]
  UnknownParam { task: String, param: String },

  /// Required parameter missing.
  #[error("task '{task}' is missing required parameter '{param}'")]
  MissingParam { task: String, param: String },

  /// Parameter value does not match its declared type.
  #[error("task '{task}' parameter '{param}': {message}")]
  InvalidParam {
    task: String,
    param: String,
    message: String,
  },

  /// Template rendering failed.
  #[error("task '{task}' failed to resolve parameter '{param}': {message}")]
  Template {
    task: String,
    param: String,
    message: String,
  },

  /// No task kind registered under this type tag.
  #[error("unknown task type '{task_type}'")]
  UnknownType { task_type: String },

  /// The task ran and failed.
  #[error("{message}")]
  Execution { message: String },
}

impl TaskError {
  /// Create an execution error.
  pub fn execution(message: impl Into<String>) -> Self {
    Self::Execution {
      message: message.into(),
    }
  }

  /// Short classification used in serialized task results.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::EmptyName | Self::UnexpectedParams { .. } | Self::UnknownType { .. } => "definition",
      Self::UnknownParam { .. } | Self::MissingParam { .. } | Self::InvalidParam { .. } => "params",
      Self::Template { .. } => "template",
      Self::Execution { .. } => "execution",
    }
  }
}
