//! Execution events and notifiers.
//!
//! Events are emitted while an execution runs so hosts can observe progress
//! (stream to a UI, persist, collect in tests) without touching the logs.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The execution has started.
  ExecutionStarted {
    execution_id: String,
    flow: String,
  },

  /// A task invocation has started.
  TaskStarted { execution_id: String, task: String },

  /// A task invocation has finished, successfully or not.
  TaskEnded {
    execution_id: String,
    task: String,
    success: bool,
  },

  /// The execution finished without a fatal error.
  ExecutionCompleted { execution_id: String },

  /// The execution was aborted by a fatal error.
  ExecutionFailed { execution_id: String, error: String },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a batch.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
