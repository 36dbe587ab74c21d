use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info};
use trellis_config::TriggerConfig;

use crate::bus::EventHandler;
use crate::error::TriggerError;
use crate::history::ExecutionHistory;
use crate::report::ExecutionReport;
use crate::trigger::{Collaborators, FlowRunner, Trigger};

/// Starts a run for every occurrence of a named event, using the event
/// payload as input.
#[derive(Debug, Clone)]
pub struct EventTrigger {
  config: TriggerConfig,
  event: String,
  history: ExecutionHistory,
}

impl EventTrigger {
  /// Build from config. The `event` option is required.
  pub fn new(config: TriggerConfig) -> Result<Self, TriggerError> {
    let event = config
      .option_str("event")
      .filter(|e| !e.is_empty())
      .ok_or_else(|| TriggerError::InvalidConfig("event trigger requires an 'event' name".to_string()))?
      .to_string();

    Ok(Self {
      config,
      event,
      history: ExecutionHistory::new(),
    })
  }

  pub fn event(&self) -> &str {
    &self.event
  }
}

#[async_trait]
impl Trigger for EventTrigger {
  fn type_name(&self) -> &str {
    "event"
  }

  fn config(&self) -> &TriggerConfig {
    &self.config
  }

  async fn register(
    &self,
    runner: Arc<dyn FlowRunner>,
    collaborators: &Collaborators,
  ) -> Result<(), TriggerError> {
    let bus = collaborators
      .event_bus
      .as_ref()
      .ok_or_else(|| TriggerError::MissingCollaborator {
        trigger_type: self.type_name().to_string(),
        collaborator: "event bus",
      })?;

    if !bus.has_event(&self.event) {
      return Err(TriggerError::UnknownEvent(self.event.clone()));
    }

    let history = self.history.clone();
    let event = self.event.clone();
    let handler: EventHandler = Arc::new(move |payload: serde_json::Value| {
      let runner = runner.clone();
      let history = history.clone();
      let event = event.clone();
      async move {
        info!(event = %event, "event trigger firing");
        history.record(runner.run(payload).await);
        debug!(event = %event, executions = history.len(), "execution recorded");
      }
      .boxed()
    });

    bus.subscribe(&self.event, self.config.mode, handler)
  }

  fn executions(&self) -> Vec<ExecutionReport> {
    self.history.snapshot()
  }
}
