//! Edge conditions.

use serde_json::Value;
use trellis_config::ConditionDef;
use trellis_task::TaskResult;

/// A predicate over a task result, gating a connection.
///
/// Conditions are stateless and compared structurally.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Condition {
  /// Met when the task succeeded.
  #[default]
  Success,
  /// Met when the task failed.
  Error,
  /// Met when the value at a dotted path of the output equals `value`.
  Matches { path: String, value: Value },
}

impl Condition {
  pub fn success() -> Self {
    Self::Success
  }

  pub fn error() -> Self {
    Self::Error
  }

  pub fn matches(path: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::Matches {
      path: path.into(),
      value: value.into(),
    }
  }

  pub fn is_met(&self, result: &TaskResult) -> bool {
    match self {
      Self::Success => result.success,
      Self::Error => !result.success,
      Self::Matches { path, value } => result
        .output
        .as_ref()
        .and_then(|output| lookup(output, path))
        .is_some_and(|found| found == value),
    }
  }
}

/// Follow a dotted path through objects (by key) and arrays (by index).
/// An empty path addresses the whole value.
fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
  if path.is_empty() {
    return Some(value);
  }

  path.split('.').try_fold(value, |current, segment| match current {
    Value::Object(map) => map.get(segment),
    Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
    _ => None,
  })
}

impl From<&ConditionDef> for Condition {
  fn from(def: &ConditionDef) -> Self {
    match def {
      ConditionDef::Success => Self::Success,
      ConditionDef::Error => Self::Error,
      ConditionDef::Matches { path, value } => Self::Matches {
        path: path.clone(),
        value: value.clone(),
      },
    }
  }
}

impl From<&Condition> for ConditionDef {
  fn from(condition: &Condition) -> Self {
    match condition {
      Condition::Success => Self::Success,
      Condition::Error => Self::Error,
      Condition::Matches { path, value } => Self::Matches {
        path: path.clone(),
        value: value.clone(),
      },
    }
  }
}
