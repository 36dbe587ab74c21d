//! The flow graph.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use trellis_task::Task;
use trellis_trigger::{Collaborators, FlowRunner, ManualTrigger, Trigger};

use crate::condition::Condition;
use crate::connection::{Connection, TaskId};
use crate::error::{ExecutionError, FlowError};
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::execution::Execution;
use crate::sequence::Sequence;

/// Non-fatal problems found by [`Flow::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowWarning {
  /// The flow has no tasks, so every run is empty.
  NoTasks,
  /// The task can never run: no path leads to it from the start task.
  UnreachableTask { name: String },
  /// The responding task is unreachable, so runs never produce a response.
  UnreachableRespondingTask { name: String },
}

impl fmt::Display for FlowWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NoTasks => write!(f, "flow has no tasks"),
      Self::UnreachableTask { name } => {
        write!(f, "task '{}' is not reachable from the start task", name)
      }
      Self::UnreachableRespondingTask { name } => {
        write!(f, "responding task '{}' is not reachable from the start task", name)
      }
    }
  }
}

/// A directed graph of tasks.
///
/// Tasks and connections live in arenas owned by the flow and refer to each
/// other by [`TaskId`]. Task insertion order matters: the first task is the
/// default start task and the last one the default responding task.
///
/// A flow is read-only while it runs. All run state lives on [`Execution`],
/// so any number of executions of one flow can run concurrently.
#[derive(Clone)]
pub struct Flow {
  name: String,
  tasks: Vec<Task>,
  connections: Vec<Connection>,
  start: Option<TaskId>,
  responding: Option<TaskId>,
  trigger: Arc<dyn Trigger>,
}

impl fmt::Debug for Flow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Flow")
      .field("name", &self.name)
      .field("tasks", &self.tasks)
      .field("connections", &self.connections)
      .field("start", &self.start)
      .field("responding", &self.responding)
      .field("trigger", &self.trigger.type_name())
      .finish()
  }
}

impl Flow {
  /// Create an empty flow with a manual trigger.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      tasks: Vec::new(),
      connections: Vec::new(),
      start: None,
      responding: None,
      trigger: Arc::new(ManualTrigger::default()),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  // -- tasks --

  /// Add a task. The first task added becomes the start task.
  pub fn add_task(&mut self, task: Task) -> Result<TaskId, FlowError> {
    if self.task_by_name(task.name()).is_some() {
      return Err(FlowError::DuplicateTask {
        name: task.name().to_string(),
      });
    }

    let id = TaskId(self.tasks.len());
    self.tasks.push(task);
    if self.start.is_none() {
      self.start = Some(id);
    }
    Ok(id)
  }

  pub fn task(&self, id: TaskId) -> Option<&Task> {
    self.tasks.get(id.0)
  }

  pub fn task_by_name(&self, name: &str) -> Option<TaskId> {
    self.tasks.iter().position(|t| t.name() == name).map(TaskId)
  }

  /// Like [`task_by_name`](Self::task_by_name), but an unknown name is an error.
  pub fn task_id(&self, name: &str) -> Result<TaskId, FlowError> {
    self.task_by_name(name).ok_or_else(|| FlowError::UnknownTask {
      name: name.to_string(),
    })
  }

  /// Tasks in insertion order.
  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
    (0..self.tasks.len()).map(TaskId)
  }

  pub(crate) fn task_name(&self, id: TaskId) -> &str {
    self.tasks.get(id.0).map(Task::name).unwrap_or("<unknown>")
  }

  fn check(&self, id: TaskId) -> Result<TaskId, FlowError> {
    match self.tasks.get(id.0) {
      Some(_) => Ok(id),
      None => Err(FlowError::UnknownTask {
        name: id.to_string(),
      }),
    }
  }

  pub fn start_task(&self) -> Option<TaskId> {
    self.start
  }

  /// Change the start task. Rejected if the new layering would leave a
  /// task with two back-edges under equal conditions.
  pub fn set_start_task(&mut self, id: TaskId) -> Result<(), FlowError> {
    let start = Some(self.check(id)?);
    self.check_back_edges(&Sequence::compute(start, &self.connections))?;
    self.start = start;
    Ok(())
  }

  /// The explicitly designated responding task, if any.
  pub fn responding_task(&self) -> Option<TaskId> {
    self.responding
  }

  /// Designate the task whose output becomes the execution's response.
  pub fn set_responding_task(&mut self, id: TaskId) -> Result<(), FlowError> {
    self.responding = Some(self.check(id)?);
    Ok(())
  }

  /// The task whose output is the response: the responding task, or the
  /// last-added task when none was set.
  pub fn response_task(&self) -> Option<TaskId> {
    self
      .responding
      .or_else(|| self.tasks.len().checked_sub(1).map(TaskId))
  }

  // -- connections --

  /// Connect `source` to `target` on success, without retries.
  pub fn connect(&mut self, source: TaskId, target: TaskId) -> Result<String, FlowError> {
    self.add_connection(source, target, Condition::Success, 0)
  }

  /// Add a connection with a generated id and return that id.
  pub fn add_connection(
    &mut self,
    source: TaskId,
    target: TaskId,
    condition: Condition,
    max_retries: u32,
  ) -> Result<String, FlowError> {
    let id = uuid::Uuid::new_v4().to_string();
    self.add_connection_with_id(id, source, target, condition, max_retries)
  }

  /// Add a connection under a caller-chosen id.
  ///
  /// Rejects a repeated `(source, target, condition)` triple, and a
  /// back-edge whose source already has a back-edge with an equal
  /// condition, since the scheduler could not tell which one fired.
  pub fn add_connection_with_id(
    &mut self,
    id: impl Into<String>,
    source: TaskId,
    target: TaskId,
    condition: Condition,
    max_retries: u32,
  ) -> Result<String, FlowError> {
    self.insert_connection(id.into(), source, target, condition, max_retries, true)
  }

  /// Add a connection. With `check_back_edges` unset only the id and
  /// triple checks run; the caller must check the finished graph.
  pub(crate) fn insert_connection(
    &mut self,
    id: String,
    source: TaskId,
    target: TaskId,
    condition: Condition,
    max_retries: u32,
    check_back_edges: bool,
  ) -> Result<String, FlowError> {
    self.check(source)?;
    self.check(target)?;

    if self.connection(&id).is_some() {
      return Err(FlowError::DuplicateConnectionId { id });
    }

    if self
      .outgoing(source)
      .any(|c| c.target == target && c.condition == condition)
    {
      return Err(FlowError::DuplicateConnection {
        source_task: self.task_name(source).to_string(),
        target: self.task_name(target).to_string(),
      });
    }

    self.connections.push(Connection {
      id: id.clone(),
      source,
      target,
      condition,
      max_retries,
    });

    if check_back_edges {
      if let Err(e) = self.check_back_edges(&self.sequence()) {
        self.connections.pop();
        return Err(e);
      }
    }

    debug!(
      flow = %self.name,
      connection = %id,
      source = %self.task_name(source),
      target = %self.task_name(target),
      "connection added"
    );
    Ok(id)
  }

  /// Remove a connection by id and return it.
  ///
  /// Removing an edge can push tasks to deeper layers and turn forward
  /// edges into back-edges, so the removal is rejected if that makes two
  /// back-edges of one task ambiguous.
  pub fn remove_connection(&mut self, id: &str) -> Result<Connection, FlowError> {
    let index = self
      .connections
      .iter()
      .position(|c| c.id == id)
      .ok_or_else(|| FlowError::UnknownConnection { id: id.to_string() })?;

    let removed = self.connections.remove(index);
    if let Err(e) = self.check_back_edges(&self.sequence()) {
      self.connections.insert(index, removed);
      return Err(e);
    }
    Ok(removed)
  }

  /// Check that no task has two back-edges with equal conditions under
  /// `sequence`. The later of the two connections is reported.
  pub(crate) fn check_back_edges(&self, sequence: &Sequence) -> Result<(), FlowError> {
    let back_edges: Vec<&Connection> = self
      .connections
      .iter()
      .filter(|c| sequence.is_back_edge(c.source, c.target))
      .collect();

    let ambiguous = back_edges.iter().enumerate().find_map(|(i, later)| {
      back_edges[..i]
        .iter()
        .any(|earlier| earlier.source == later.source && earlier.condition == later.condition)
        .then_some(*later)
    });

    match ambiguous {
      Some(c) => Err(FlowError::AmbiguousBackEdge {
        source_task: self.task_name(c.source).to_string(),
        target: self.task_name(c.target).to_string(),
      }),
      None => Ok(()),
    }
  }

  pub fn connection(&self, id: &str) -> Option<&Connection> {
    self.connections.iter().find(|c| c.id == id)
  }

  /// Connections in insertion order.
  pub fn connections(&self) -> &[Connection] {
    &self.connections
  }

  pub fn outgoing(&self, task: TaskId) -> impl Iterator<Item = &Connection> {
    self.connections.iter().filter(move |c| c.source == task)
  }

  pub fn incoming(&self, task: TaskId) -> impl Iterator<Item = &Connection> {
    self.connections.iter().filter(move |c| c.target == task)
  }

  // -- graph --

  /// Layered ordering of the tasks, recomputed from the current connections.
  pub fn sequence(&self) -> Sequence {
    Sequence::compute(self.start, &self.connections)
  }

  /// Task names per layer.
  pub fn sequence_names(&self) -> Vec<Vec<String>> {
    self
      .sequence()
      .layers()
      .iter()
      .map(|layer| {
        layer
          .iter()
          .map(|&id| self.task_name(id).to_string())
          .collect()
      })
      .collect()
  }

  pub fn depth(&self, task: TaskId) -> Option<usize> {
    self.sequence().depth(task)
  }

  /// Report problems that do not prevent running the flow.
  pub fn validate(&self) -> Vec<FlowWarning> {
    if self.tasks.is_empty() {
      return vec![FlowWarning::NoTasks];
    }

    let sequence = self.sequence();
    let mut warnings: Vec<FlowWarning> = self
      .task_ids()
      .filter(|&id| !sequence.contains(id))
      .map(|id| FlowWarning::UnreachableTask {
        name: self.task_name(id).to_string(),
      })
      .collect();

    if let Some(id) = self.response_task().filter(|&id| !sequence.contains(id)) {
      warnings.push(FlowWarning::UnreachableRespondingTask {
        name: self.task_name(id).to_string(),
      });
    }

    warnings
  }

  // -- trigger --

  pub fn with_trigger(mut self, trigger: Arc<dyn Trigger>) -> Self {
    self.trigger = trigger;
    self
  }

  pub fn set_trigger(&mut self, trigger: Arc<dyn Trigger>) {
    self.trigger = trigger;
  }

  pub fn trigger(&self) -> &Arc<dyn Trigger> {
    &self.trigger
  }

  /// Bind this flow to its trigger's event source.
  pub async fn register_trigger(
    self: &Arc<Self>,
    collaborators: &Collaborators,
  ) -> Result<(), FlowError> {
    let runner: Arc<dyn FlowRunner> = self.clone();
    self.trigger.register(runner, collaborators).await?;
    Ok(())
  }

  // -- runs --

  pub fn create_execution(&self) -> Execution<'_> {
    Execution::new(self, Arc::new(NoopNotifier))
  }

  pub fn create_execution_with(&self, notifier: Arc<dyn ExecutionNotifier>) -> Execution<'_> {
    Execution::new(self, notifier)
  }

  /// Create an execution, run it to completion and return it.
  pub async fn start(&self, input: serde_json::Value) -> Result<Execution<'_>, ExecutionError> {
    let mut execution = self.create_execution();
    execution.start(input).await?;
    Ok(execution)
  }
}
