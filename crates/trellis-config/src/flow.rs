use serde::{Deserialize, Serialize};

use crate::connection::ConnectionDef;
use crate::task::TaskDef;
use crate::trigger::TriggerDef;

/// Serialized task graph.
///
/// ```json
/// {
///   "trigger": { "type": "manual", "config": { "mode": "sync" } },
///   "tasks": {
///     "greet": { "type": "log", "params": { "message": "hi {{ flow.output.name }}" } }
///   },
///   "connections": {},
///   "start_task": "greet"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDef {
  pub trigger: TriggerDef,
  #[serde(with = "crate::ordered")]
  pub tasks: Vec<(String, TaskDef)>,
  #[serde(default, with = "crate::ordered")]
  pub connections: Vec<(String, ConnectionDef)>,
  pub start_task: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub responding_task: Option<String>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{ConditionDef, DispatchMode};

  #[test]
  fn test_keeps_task_order() {
    let raw = json!({
      "trigger": { "type": "manual" },
      "tasks": {
        "zeta": { "type": "log", "params": { "message": "z" } },
        "alpha": { "type": "log", "params": { "message": "a" } },
        "mid": { "type": "log" }
      },
      "start_task": "zeta"
    });

    let def: FlowDef = serde_json::from_value(raw).unwrap();
    let names: Vec<_> = def.tasks.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert!(def.connections.is_empty());
    assert_eq!(def.trigger.config.mode, DispatchMode::Sync);
  }

  #[test]
  fn test_connection_config() {
    let raw = json!({
      "trigger": { "type": "event", "config": { "mode": "async", "event": "order.created" } },
      "tasks": { "a": { "type": "log" }, "b": { "type": "log" } },
      "connections": {
        "c1": {
          "source": "a",
          "target": "b",
          "config": {
            "condition": { "type": "matches", "path": "inner.result", "value": 2 },
            "max_retries": 3
          }
        },
        "c2": { "source": "b", "target": "a" }
      },
      "start_task": "a",
      "responding_task": "b"
    });

    let def: FlowDef = serde_json::from_value(raw).unwrap();
    let (id, conn) = &def.connections[0];
    assert_eq!(id, "c1");
    assert_eq!(
      conn.config.condition,
      Some(ConditionDef::Matches {
        path: "inner.result".to_string(),
        value: json!(2),
      })
    );
    assert_eq!(conn.config.max_retries, Some(3));
    assert_eq!(def.connections[1].1.config.condition, None);
    assert_eq!(def.trigger.config.option_str("event"), Some("order.created"));
    assert_eq!(def.responding_task.as_deref(), Some("b"));
  }

  #[test]
  fn test_roundtrip() {
    let raw = json!({
      "trigger": { "type": "http", "config": { "mode": "sync", "method": "GET", "path": "/hello" } },
      "tasks": { "b": { "type": "render", "params": { "template": "{{ flow.output }}" } }, "a": { "type": "log" } },
      "connections": { "x": { "source": "b", "target": "a", "config": { "condition": { "type": "error" } } } },
      "start_task": "b"
    });

    let def: FlowDef = serde_json::from_value(raw.clone()).unwrap();
    let back = serde_json::to_value(&def).unwrap();
    assert_eq!(back, raw);
  }
}
