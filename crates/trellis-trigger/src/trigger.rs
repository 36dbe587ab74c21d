//! The trigger capability interface.

use std::sync::Arc;

use async_trait::async_trait;
use trellis_config::{TriggerConfig, TriggerDef};

use crate::bus::EventBus;
use crate::error::TriggerError;
use crate::report::ExecutionReport;
use crate::router::HttpRouter;

/// Something that can run a flow to completion.
///
/// Implemented by `trellis_flow::Flow`; triggers only depend on this seam.
#[async_trait]
pub trait FlowRunner: Send + Sync {
  /// Start a fresh execution with `input` and wait for it to finish.
  async fn run(&self, input: serde_json::Value) -> ExecutionReport;
}

/// External systems a trigger may bind to.
#[derive(Clone, Default)]
pub struct Collaborators {
  pub event_bus: Option<Arc<dyn EventBus>>,
  pub router: Option<Arc<dyn HttpRouter>>,
}

impl Collaborators {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
    self.event_bus = Some(bus);
    self
  }

  pub fn with_router(mut self, router: Arc<dyn HttpRouter>) -> Self {
    self.router = Some(router);
    self
  }
}

/// Binding between an event source and flow runs.
#[async_trait]
pub trait Trigger: Send + Sync {
  /// Registry type tag, e.g. `"http"`.
  fn type_name(&self) -> &str;

  fn config(&self) -> &TriggerConfig;

  /// Bind `runner` to this trigger's event source.
  async fn register(
    &self,
    runner: Arc<dyn FlowRunner>,
    collaborators: &Collaborators,
  ) -> Result<(), TriggerError>;

  /// Reports of the executions this trigger has started so far.
  fn executions(&self) -> Vec<ExecutionReport>;

  /// Serialized form of this trigger.
  fn to_def(&self) -> TriggerDef {
    TriggerDef {
      trigger_type: self.type_name().to_string(),
      config: self.config().clone(),
    }
  }
}
