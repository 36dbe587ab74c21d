use serde::{Deserialize, Serialize};

/// A task declaration: the registry type tag plus its raw parameters.
///
/// Parameter values are kept exactly as declared, so template strings such as
/// `"{{ fetch.output.id }}"` survive a save/load cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
  #[serde(rename = "type")]
  pub task_type: String,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub params: serde_json::Map<String, serde_json::Value>,
}
