//! Trigger kinds by type tag.

use std::collections::HashMap;
use std::sync::Arc;

use trellis_config::{TriggerConfig, TriggerDef};

use crate::error::TriggerError;
use crate::event::EventTrigger;
use crate::http::HttpTrigger;
use crate::manual::ManualTrigger;
use crate::trigger::Trigger;

/// Builds a trigger from its config.
pub type TriggerConstructor =
  Arc<dyn Fn(TriggerConfig) -> Result<Arc<dyn Trigger>, TriggerError> + Send + Sync>;

/// Maps type tags to trigger constructors so serialized flows can be rebuilt.
#[derive(Clone, Default)]
pub struct TriggerRegistry {
  constructors: HashMap<String, TriggerConstructor>,
}

impl TriggerRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with the `manual`, `event` and `http` triggers.
  pub fn with_builtin() -> Self {
    let mut registry = Self::new();
    registry
      .register("manual", |config| Ok(Arc::new(ManualTrigger::new(config))))
      .register("event", |config| Ok(Arc::new(EventTrigger::new(config)?)))
      .register("http", |config| Ok(Arc::new(HttpTrigger::new(config)?)));
    registry
  }

  pub fn register<F>(&mut self, trigger_type: impl Into<String>, constructor: F) -> &mut Self
  where
    F: Fn(TriggerConfig) -> Result<Arc<dyn Trigger>, TriggerError> + Send + Sync + 'static,
  {
    self
      .constructors
      .insert(trigger_type.into(), Arc::new(constructor));
    self
  }

  pub fn contains(&self, trigger_type: &str) -> bool {
    self.constructors.contains_key(trigger_type)
  }

  pub fn create(&self, def: &TriggerDef) -> Result<Arc<dyn Trigger>, TriggerError> {
    let constructor = self
      .constructors
      .get(&def.trigger_type)
      .ok_or_else(|| TriggerError::UnknownType(def.trigger_type.clone()))?;
    constructor(def.config.clone())
  }
}
