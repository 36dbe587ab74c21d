use std::fmt;

use crate::condition::Condition;

/// Index of a task inside its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
  pub fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A directed edge between two tasks of the same flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
  pub(crate) id: String,
  pub(crate) source: TaskId,
  pub(crate) target: TaskId,
  pub(crate) condition: Condition,
  pub(crate) max_retries: u32,
}

impl Connection {
  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn source(&self) -> TaskId {
    self.source
  }

  pub fn target(&self) -> TaskId {
    self.target
  }

  pub fn condition(&self) -> &Condition {
    &self.condition
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }
}
