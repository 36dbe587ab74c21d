use serde::{Deserialize, Serialize};

/// Serialized form of an edge condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionDef {
  #[default]
  Success,
  Error,
  Matches {
    path: String,
    value: serde_json::Value,
  },
}
