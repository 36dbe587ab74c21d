//! Event bus collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use tracing::debug;
use trellis_config::DispatchMode;

use crate::error::TriggerError;

/// Callback invoked with an event's payload.
pub type EventHandler = Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// What the event trigger needs from an event bus.
pub trait EventBus: Send + Sync {
  /// Check if an event with this name exists.
  fn has_event(&self, event: &str) -> bool;

  /// Subscribe `handler` to `event`. With [`DispatchMode::Sync`] the bus
  /// waits for the handler before returning from an emit.
  fn subscribe(
    &self,
    event: &str,
    mode: DispatchMode,
    handler: EventHandler,
  ) -> Result<(), TriggerError>;
}

struct Subscription {
  mode: DispatchMode,
  handler: EventHandler,
}

/// In-process event bus.
///
/// Events must be declared with [`LocalEventBus::register_event`] before
/// anything can subscribe to them.
#[derive(Default)]
pub struct LocalEventBus {
  events: Mutex<HashMap<String, Vec<Subscription>>>,
}

impl LocalEventBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare an event. Declaring an existing event is a no-op.
  pub fn register_event(&self, event: impl Into<String>) {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(event.into())
      .or_default();
  }

  /// Deliver `payload` to every subscriber of `event`.
  ///
  /// Sync subscribers are awaited in subscription order; async ones are
  /// spawned on the current tokio runtime. Returns the number of
  /// subscribers notified.
  pub async fn emit(&self, event: &str, payload: serde_json::Value) -> Result<usize, TriggerError> {
    let subscribers: Vec<(DispatchMode, EventHandler)> = {
      let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
      let subs = events
        .get(event)
        .ok_or_else(|| TriggerError::UnknownEvent(event.to_string()))?;
      subs.iter().map(|s| (s.mode, s.handler.clone())).collect()
    };

    debug!(event = %event, subscribers = subscribers.len(), "emitting event");

    for (mode, handler) in &subscribers {
      let fut = handler(payload.clone());
      match mode {
        DispatchMode::Sync => fut.await,
        DispatchMode::Async => {
          tokio::spawn(fut);
        }
      }
    }

    Ok(subscribers.len())
  }
}

impl EventBus for LocalEventBus {
  fn has_event(&self, event: &str) -> bool {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(event)
  }

  fn subscribe(
    &self,
    event: &str,
    mode: DispatchMode,
    handler: EventHandler,
  ) -> Result<(), TriggerError> {
    let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
    let subs = events
      .get_mut(event)
      .ok_or_else(|| TriggerError::UnknownEvent(event.to_string()))?;
    subs.push(Subscription { mode, handler });
    Ok(())
  }
}
