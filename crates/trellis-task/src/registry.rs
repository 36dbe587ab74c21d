//! Task kinds by type tag.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TaskError;
use crate::task::{Params, Task, TaskKind};

/// Maps type tags to task kinds so serialized flows can be rebuilt.
///
/// The registry is an ordinary value handed to whoever deserializes flows;
/// there is no process-wide registry.
#[derive(Clone, Default)]
pub struct TaskRegistry {
  kinds: HashMap<String, Arc<dyn TaskKind>>,
}

impl TaskRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a kind under its own type tag, replacing any previous one.
  pub fn register(&mut self, kind: impl TaskKind + 'static) -> &mut Self {
    self.register_shared(Arc::new(kind))
  }

  pub fn register_shared(&mut self, kind: Arc<dyn TaskKind>) -> &mut Self {
    self.kinds.insert(kind.type_name().to_string(), kind);
    self
  }

  pub fn get(&self, task_type: &str) -> Option<&Arc<dyn TaskKind>> {
    self.kinds.get(task_type)
  }

  pub fn contains(&self, task_type: &str) -> bool {
    self.kinds.contains_key(task_type)
  }

  /// Registered type tags, sorted.
  pub fn types(&self) -> Vec<&str> {
    let mut types: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
    types.sort_unstable();
    types
  }

  /// Build a task of the given type.
  pub fn create(&self, task_type: &str, name: &str, params: Params) -> Result<Task, TaskError> {
    let kind = self.get(task_type).ok_or_else(|| TaskError::UnknownType {
      task_type: task_type.to_string(),
    })?;
    Task::from_kind(name, kind.clone(), params)
  }
}
