use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use trellis_config::{DispatchMode, TriggerConfig};

use crate::error::TriggerError;
use crate::history::ExecutionHistory;
use crate::report::ExecutionReport;
use crate::trigger::{Collaborators, FlowRunner, Trigger};

/// Runs the flow once, as soon as it is registered.
///
/// The optional `input` config option is used as the start input
/// (`null` otherwise).
#[derive(Debug, Clone, Default)]
pub struct ManualTrigger {
  config: TriggerConfig,
  history: ExecutionHistory,
}

impl ManualTrigger {
  pub fn new(config: TriggerConfig) -> Self {
    Self {
      config,
      history: ExecutionHistory::new(),
    }
  }
}

#[async_trait]
impl Trigger for ManualTrigger {
  fn type_name(&self) -> &str {
    "manual"
  }

  fn config(&self) -> &TriggerConfig {
    &self.config
  }

  async fn register(
    &self,
    runner: Arc<dyn FlowRunner>,
    _collaborators: &Collaborators,
  ) -> Result<(), TriggerError> {
    let input = self
      .config
      .options
      .get("input")
      .cloned()
      .unwrap_or(serde_json::Value::Null);

    info!(mode = ?self.config.mode, "manual trigger firing");

    match self.config.mode {
      DispatchMode::Sync => {
        let report = runner.run(input).await;
        self.history.record(report);
        debug!(executions = self.history.len(), "execution recorded");
      }
      DispatchMode::Async => {
        let history = self.history.clone();
        tokio::spawn(async move {
          history.record(runner.run(input).await);
          debug!(executions = history.len(), "execution recorded");
        });
      }
    }

    Ok(())
  }

  fn executions(&self) -> Vec<ExecutionReport> {
    self.history.snapshot()
  }
}
