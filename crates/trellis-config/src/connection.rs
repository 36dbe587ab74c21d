use serde::{Deserialize, Serialize};

use crate::condition::ConditionDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDef {
  pub source: String,
  pub target: String,
  #[serde(default)]
  pub config: ConnectionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<ConditionDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_retries: Option<u32>,
}
