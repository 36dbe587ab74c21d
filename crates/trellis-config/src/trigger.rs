use serde::{Deserialize, Serialize};

/// How an event source waits on the executions it starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
  /// The caller waits for the execution to finish.
  #[default]
  Sync,
  /// The execution is started in the background.
  Async,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
  #[serde(rename = "type")]
  pub trigger_type: String,
  #[serde(default)]
  pub config: TriggerConfig,
}

/// Trigger configuration. `mode` is common to every trigger kind, the
/// remaining keys are kind specific (`event` for event triggers, `method`
/// and `path` for http triggers).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
  #[serde(default)]
  pub mode: DispatchMode,
  #[serde(flatten)]
  pub options: serde_json::Map<String, serde_json::Value>,
}

impl TriggerConfig {
  pub fn new(mode: DispatchMode) -> Self {
    Self {
      mode,
      options: serde_json::Map::new(),
    }
  }

  /// Add a kind specific option.
  pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
    self.options.insert(key.into(), value.into());
    self
  }

  /// Get a string option.
  pub fn option_str(&self, key: &str) -> Option<&str> {
    self.options.get(key).and_then(|v| v.as_str())
  }
}
