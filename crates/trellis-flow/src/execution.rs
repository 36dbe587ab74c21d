//! One run of a flow.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, error, info, instrument, warn};
use trellis_task::{Inputs, TaskResult};
use trellis_trigger::{ExecutionReport, LogRecord};

use crate::connection::TaskId;
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::flow::Flow;
use crate::sequence::Sequence;

/// Lifecycle of an [`Execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
  NotStarted,
  Running,
  Finished,
}

/// A completed task invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
  pub task: TaskId,
  pub result: TaskResult,
  pub end: DateTime<Utc>,
}

/// One run of a [`Flow`].
///
/// The flow is borrowed read-only; inputs, logs and the ready queue are owned
/// here, so executions of the same flow never share mutable state.
pub struct Execution<'a> {
  id: String,
  flow: &'a Flow,
  notifier: Arc<dyn ExecutionNotifier>,
  inputs: Inputs,
  logs: Vec<LogEntry>,
  queue: Vec<TaskId>,
  state: ExecutionState,
  started_at: Option<DateTime<Utc>>,
  finished_at: Option<DateTime<Utc>>,
  fatal: Option<ExecutionError>,
}

impl fmt::Debug for Execution<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Execution")
      .field("id", &self.id)
      .field("flow", &self.flow)
      .field("inputs", &self.inputs)
      .field("logs", &self.logs)
      .field("queue", &self.queue)
      .field("state", &self.state)
      .field("started_at", &self.started_at)
      .field("finished_at", &self.finished_at)
      .field("fatal", &self.fatal)
      .finish_non_exhaustive()
  }
}

/// Per-run scheduling context, fixed once the run starts.
struct Schedule {
  sequence: Sequence,
  responding: Option<TaskId>,
}

/// Scheduling state of the batch being completed.
#[derive(Default)]
struct Batch {
  next: Vec<TaskId>,
  responded: bool,
}

impl<'a> Execution<'a> {
  pub(crate) fn new(flow: &'a Flow, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      flow,
      notifier,
      inputs: Inputs::new(),
      logs: Vec::new(),
      queue: Vec::new(),
      state: ExecutionState::NotStarted,
      started_at: None,
      finished_at: None,
      fatal: None,
    }
  }

  /// Run the flow to completion.
  ///
  /// Ready tasks run concurrently in batches; a batch finishes completely
  /// before the next one is scheduled. Task failures are recorded in the logs
  /// and only steer the run through conditions. A retry-limit violation
  /// aborts the run once the current batch has finished.
  #[instrument(
    name = "flow_execute",
    skip(self, input),
    fields(flow = %self.flow.name(), execution_id = %self.id)
  )]
  pub async fn start(&mut self, input: serde_json::Value) -> Result<(), ExecutionError> {
    if self.state != ExecutionState::NotStarted {
      return Err(ExecutionError::AlreadyStarted);
    }

    self.state = ExecutionState::Running;
    self.started_at = Some(Utc::now());
    self
      .inputs
      .insert("flow".to_string(), TaskResult::flow_input(input));
    self.queue = self.flow.start_task().into_iter().collect();

    info!(execution_id = %self.id, flow = %self.flow.name(), "workflow_started");
    self.notifier.notify(ExecutionEvent::ExecutionStarted {
      execution_id: self.id.clone(),
      flow: self.flow.name().to_string(),
    });

    let schedule = Schedule {
      sequence: self.flow.sequence(),
      responding: self.flow.response_task(),
    };
    let result = self.run_loop(&schedule).await;

    self.finished_at = Some(Utc::now());
    self.state = ExecutionState::Finished;

    match &result {
      Ok(()) => {
        info!(
          execution_id = %self.id,
          tasks_run = self.logs.len(),
          errors = self.error_count(),
          "workflow_completed"
        );
        self.notifier.notify(ExecutionEvent::ExecutionCompleted {
          execution_id: self.id.clone(),
        });
      }
      Err(e) => {
        error!(execution_id = %self.id, error = %e, "workflow_failed");
        self.fatal = Some(e.clone());
        self.notifier.notify(ExecutionEvent::ExecutionFailed {
          execution_id: self.id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  async fn run_loop(&mut self, schedule: &Schedule) -> Result<(), ExecutionError> {
    let flow = self.flow;
    let notifier = self.notifier.clone();
    let execution_id = self.id.clone();

    while !self.queue.is_empty() {
      let ready = std::mem::take(&mut self.queue);
      debug!(
        execution_id = %execution_id,
        ready = ?ready.iter().map(|&id| flow.task_name(id)).collect::<Vec<_>>(),
        "executing batch of ready tasks"
      );

      // Every task in the batch sees the inputs as they were when it started.
      let snapshot = self.inputs.clone();
      let inputs = &snapshot;
      let notifier = &notifier;
      let execution_id = &execution_id;
      let mut running: FuturesUnordered<_> = ready
        .into_iter()
        .filter_map(|id| flow.task(id).map(|task| (id, task)))
        .map(move |(id, task)| {
          async move {
            info!(execution_id = %execution_id, task = %task.name(), "task_started");
            notifier.notify(ExecutionEvent::TaskStarted {
              execution_id: execution_id.clone(),
              task: task.name().to_string(),
            });

            let result = task.run(inputs).await;

            notifier.notify(ExecutionEvent::TaskEnded {
              execution_id: execution_id.clone(),
              task: task.name().to_string(),
              success: result.success,
            });
            (id, result)
          }
        })
        .collect();

      let mut batch = Batch::default();
      let mut fatal = None;
      while let Some((id, result)) = running.next().await {
        if let Err(e) = self.complete(id, result, schedule, &mut batch) {
          fatal.get_or_insert(e);
        }
      }

      if let Some(e) = fatal {
        return Err(e);
      }
      self.queue = batch.next;
    }

    Ok(())
  }

  /// Record a finished task and admit the targets it unlocks.
  fn complete(
    &mut self,
    id: TaskId,
    result: TaskResult,
    schedule: &Schedule,
    batch: &mut Batch,
  ) -> Result<(), ExecutionError> {
    let flow = self.flow;
    let name = flow.task_name(id);

    if result.success {
      info!(
        execution_id = %self.id,
        task = %name,
        duration_ms = result.duration_ms,
        "task_completed"
      );
    } else {
      let message = result.error.as_ref().map(|e| e.message.as_str()).unwrap_or("");
      warn!(execution_id = %self.id, task = %name, error = %message, "task_failed");
    }

    self.inputs.insert(name.to_string(), result.clone());
    self.logs.push(LogEntry {
      task: id,
      result,
      end: Utc::now(),
    });

    if schedule.responding == Some(id) {
      debug!(execution_id = %self.id, task = %name, "responding task finished");
      batch.next.clear();
      batch.responded = true;
      return Ok(());
    }
    if batch.responded {
      return Ok(());
    }

    let Some(result) = self.logs.last().map(|entry| &entry.result) else {
      return Ok(());
    };

    for connection in flow.outgoing(id).filter(|c| c.condition.is_met(result)) {
      let target = connection.target;
      let runs = self.successful_runs(target);
      if runs > connection.max_retries as usize {
        let task = flow.task_name(target).to_string();
        warn!(
          execution_id = %self.id,
          task = %task,
          runs,
          max_retries = connection.max_retries,
          "retry_limit_exceeded"
        );
        return Err(ExecutionError::RetryLimitExceeded {
          task,
          runs,
          max_retries: connection.max_retries,
        });
      }

      if self.is_ready(target, &schedule.sequence) && !batch.next.contains(&target) {
        batch.next.push(target);
      }
    }

    Ok(())
  }

  /// Every forward predecessor of `task` has produced a log entry.
  /// Back-edge and unreachable predecessors are not waited for.
  fn is_ready(&self, task: TaskId, sequence: &Sequence) -> bool {
    let Some(depth) = sequence.depth(task) else {
      return true;
    };

    self
      .flow
      .incoming(task)
      .filter(|c| sequence.depth(c.source).is_some_and(|d| d < depth))
      .all(|c| self.logs.iter().any(|entry| entry.task == c.source))
  }

  fn successful_runs(&self, task: TaskId) -> usize {
    self
      .logs
      .iter()
      .filter(|entry| entry.task == task && entry.result.success)
      .count()
  }

  // -- results --

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn flow(&self) -> &'a Flow {
    self.flow
  }

  pub fn state(&self) -> ExecutionState {
    self.state
  }

  /// Results by task name, including the `"flow"` start input.
  pub fn inputs(&self) -> &Inputs {
    &self.inputs
  }

  /// Completed task invocations in completion order.
  pub fn logs(&self) -> &[LogEntry] {
    &self.logs
  }

  pub fn started_at(&self) -> Option<DateTime<Utc>> {
    self.started_at
  }

  pub fn finished_at(&self) -> Option<DateTime<Utc>> {
    self.finished_at
  }

  /// The error that aborted the run, if any.
  pub fn fatal(&self) -> Option<&ExecutionError> {
    self.fatal.as_ref()
  }

  /// Output of the last invocation of the response task.
  pub fn response(&self) -> Option<&serde_json::Value> {
    let task = self.flow.response_task()?;
    self
      .logs
      .iter()
      .rev()
      .find(|entry| entry.task == task)
      .and_then(|entry| entry.result.output.as_ref())
  }

  /// Log entries of failed invocations.
  pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
    self.logs.iter().filter(|entry| !entry.result.success)
  }

  pub fn has_errors(&self) -> bool {
    self.errors().next().is_some()
  }

  pub fn error_count(&self) -> usize {
    self.errors().count()
  }

  /// Owned snapshot of this execution.
  pub fn report(&self) -> ExecutionReport {
    ExecutionReport {
      execution_id: self.id.clone(),
      started_at: self.started_at,
      finished_at: self.finished_at,
      logs: self
        .logs
        .iter()
        .map(|entry| LogRecord {
          task: self.flow.task_name(entry.task).to_string(),
          end: entry.end,
          result: entry.result.clone(),
        })
        .collect(),
      response: self.response().cloned(),
      fatal: self.fatal.as_ref().map(ToString::to_string),
    }
  }
}
