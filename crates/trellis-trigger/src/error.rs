use thiserror::Error;

/// Errors raised while building or registering triggers.
#[derive(Debug, Error)]
pub enum TriggerError {
  #[error("unknown trigger type '{0}'")]
  UnknownType(String),

  #[error("invalid trigger configuration: {0}")]
  InvalidConfig(String),

  #[error("event '{0}' is not registered on the event bus")]
  UnknownEvent(String),

  #[error("trigger '{trigger_type}' needs a {collaborator} collaborator")]
  MissingCollaborator {
    trigger_type: String,
    collaborator: &'static str,
  },

  #[error("route {method} {path} is already registered")]
  RouteConflict { method: String, path: String },
}
