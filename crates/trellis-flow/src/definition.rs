//! Conversion between [`Flow`] and its serialized form.

use trellis_config::{ConditionDef, ConnectionConfig, ConnectionDef, FlowDef};
use trellis_task::TaskRegistry;
use trellis_trigger::TriggerRegistry;

use crate::condition::Condition;
use crate::error::FlowError;
use crate::flow::Flow;

impl Flow {
  /// Serialized form of this flow.
  pub fn to_def(&self) -> FlowDef {
    let tasks = self
      .tasks()
      .iter()
      .map(|task| (task.name().to_string(), task.to_def()))
      .collect();

    let connections = self
      .connections()
      .iter()
      .map(|c| {
        let def = ConnectionDef {
          source: self.task_name(c.source()).to_string(),
          target: self.task_name(c.target()).to_string(),
          config: ConnectionConfig {
            condition: Some(ConditionDef::from(c.condition())),
            max_retries: (c.max_retries() > 0).then_some(c.max_retries()),
          },
        };
        (c.id().to_string(), def)
      })
      .collect();

    FlowDef {
      trigger: self.trigger().to_def(),
      tasks,
      connections,
      start_task: self
        .start_task()
        .map(|id| self.task_name(id).to_string())
        .unwrap_or_default(),
      responding_task: self
        .responding_task()
        .map(|id| self.task_name(id).to_string()),
    }
  }

  /// Build a flow from its serialized form, looking task and trigger types
  /// up in the given registries.
  ///
  /// The back-edge rule is checked once, against the finished graph. A flow
  /// may have been built with a different start task or with connections
  /// that were later removed, so replaying the rule connection by connection
  /// could reject a definition that [`to_def`](Self::to_def) produced.
  pub fn from_def(
    name: impl Into<String>,
    def: &FlowDef,
    tasks: &TaskRegistry,
    triggers: &TriggerRegistry,
  ) -> Result<Self, FlowError> {
    let mut flow = Flow::new(name).with_trigger(triggers.create(&def.trigger)?);

    for (task_name, task_def) in &def.tasks {
      let task = tasks.create(&task_def.task_type, task_name, task_def.params.clone())?;
      flow.add_task(task)?;
    }

    if !def.start_task.is_empty() {
      let start = flow.task_id(&def.start_task)?;
      flow.set_start_task(start)?;
    }

    for (id, connection) in &def.connections {
      let source = flow.task_id(&connection.source)?;
      let target = flow.task_id(&connection.target)?;
      let condition = connection
        .config
        .condition
        .as_ref()
        .map(Condition::from)
        .unwrap_or_default();
      let max_retries = connection.config.max_retries.unwrap_or(0);
      flow.insert_connection(id.clone(), source, target, condition, max_retries, false)?;
    }
    flow.check_back_edges(&flow.sequence())?;

    if let Some(responding) = &def.responding_task {
      let id = flow.task_id(responding)?;
      flow.set_responding_task(id)?;
    }

    Ok(flow)
  }

  /// Parse a JSON flow definition and build the flow.
  pub fn from_json(
    name: impl Into<String>,
    json: &str,
    tasks: &TaskRegistry,
    triggers: &TriggerRegistry,
  ) -> Result<Self, FlowError> {
    let def: FlowDef = serde_json::from_str(json).map_err(|e| FlowError::InvalidDefinition {
      message: e.to_string(),
    })?;
    Self::from_def(name, &def, tasks, triggers)
  }
}
