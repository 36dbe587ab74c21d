//! Integration tests for triggers against the in-process collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use trellis_config::{DispatchMode, TriggerConfig, TriggerDef};
use trellis_task::{ErrorInfo, Params, TaskResult};
use trellis_trigger::{
  Collaborators, EventTrigger, ExecutionReport, FlowRunner, HttpRequest, HttpTrigger,
  LocalEventBus, LocalRouter, LogRecord, ManualTrigger, Trigger, TriggerError, TriggerRegistry,
};

/// Echoes its input back as the response, or fails when the input says so.
#[derive(Default)]
struct StubRunner {
  inputs: Mutex<Vec<Value>>,
}

impl StubRunner {
  fn inputs(&self) -> Vec<Value> {
    self.inputs.lock().unwrap().clone()
  }
}

#[async_trait]
impl FlowRunner for StubRunner {
  async fn run(&self, input: Value) -> ExecutionReport {
    self.inputs.lock().unwrap().push(input.clone());

    let fail = input.pointer("/body/fail").and_then(Value::as_bool).unwrap_or(false);
    let result = TaskResult {
      start: Utc::now(),
      output: (!fail).then(|| input.clone()),
      error: fail.then(|| ErrorInfo {
        kind: "execution".to_string(),
        message: "boom".to_string(),
      }),
      success: !fail,
      params: Params::new(),
      duration_ms: 0,
    };

    ExecutionReport {
      execution_id: "exec-1".to_string(),
      started_at: Some(Utc::now()),
      finished_at: Some(Utc::now()),
      response: result.output.clone(),
      logs: vec![LogRecord {
        task: "only".to_string(),
        end: Utc::now(),
        result,
      }],
      fatal: None,
    }
  }
}

#[tokio::test]
async fn test_manual_runs_once_on_register() {
  let runner = Arc::new(StubRunner::default());
  let trigger = ManualTrigger::new(TriggerConfig::new(DispatchMode::Sync).with_option("input", json!({"a": 1})));

  trigger
    .register(runner.clone(), &Collaborators::new())
    .await
    .unwrap();

  assert_eq!(runner.inputs(), vec![json!({"a": 1})]);
  assert_eq!(trigger.executions().len(), 1);
}

#[tokio::test]
async fn test_event_requires_registered_event() {
  let bus = Arc::new(LocalEventBus::new());
  let trigger = EventTrigger::new(
    TriggerConfig::new(DispatchMode::Sync).with_option("event", "order.created"),
  )
  .unwrap();

  let collaborators = Collaborators::new().with_event_bus(bus);
  let result = trigger
    .register(Arc::new(StubRunner::default()), &collaborators)
    .await;

  assert!(matches!(result, Err(TriggerError::UnknownEvent(e)) if e == "order.created"));
}

#[tokio::test]
async fn test_event_requires_bus() {
  let trigger =
    EventTrigger::new(TriggerConfig::new(DispatchMode::Sync).with_option("event", "x")).unwrap();

  let result = trigger
    .register(Arc::new(StubRunner::default()), &Collaborators::new())
    .await;

  assert!(matches!(result, Err(TriggerError::MissingCollaborator { .. })));
}

#[test]
fn test_event_requires_name() {
  let result = EventTrigger::new(TriggerConfig::new(DispatchMode::Sync));
  assert!(matches!(result, Err(TriggerError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_event_sync_dispatch() {
  let bus = Arc::new(LocalEventBus::new());
  bus.register_event("order.created");
  let runner = Arc::new(StubRunner::default());
  let trigger = EventTrigger::new(
    TriggerConfig::new(DispatchMode::Sync).with_option("event", "order.created"),
  )
  .unwrap();

  trigger
    .register(runner.clone(), &Collaborators::new().with_event_bus(bus.clone()))
    .await
    .unwrap();

  let notified = bus.emit("order.created", json!({"id": 1})).await.unwrap();
  bus.emit("order.created", json!({"id": 2})).await.unwrap();

  assert_eq!(notified, 1);
  assert_eq!(runner.inputs(), vec![json!({"id": 1}), json!({"id": 2})]);
  assert_eq!(trigger.executions().len(), 2);
}

#[tokio::test]
async fn test_event_async_dispatch() {
  let bus = Arc::new(LocalEventBus::new());
  bus.register_event("tick");
  let runner = Arc::new(StubRunner::default());
  let trigger =
    EventTrigger::new(TriggerConfig::new(DispatchMode::Async).with_option("event", "tick")).unwrap();

  trigger
    .register(runner.clone(), &Collaborators::new().with_event_bus(bus.clone()))
    .await
    .unwrap();
  bus.emit("tick", json!(1)).await.unwrap();

  for _ in 0..50 {
    if !trigger.executions().is_empty() {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert_eq!(trigger.executions().len(), 1);
}

#[tokio::test]
async fn test_http_sync_maps_response() {
  let router = Arc::new(LocalRouter::new());
  let trigger = HttpTrigger::new(
    TriggerConfig::new(DispatchMode::Sync)
      .with_option("method", "post")
      .with_option("path", "/orders"),
  )
  .unwrap();

  trigger
    .register(
      Arc::new(StubRunner::default()),
      &Collaborators::new().with_router(router.clone()),
    )
    .await
    .unwrap();

  let ok = router
    .dispatch(HttpRequest::new("POST", "/orders").with_body(json!({"qty": 2})))
    .await
    .unwrap();
  assert_eq!(ok.status, 200);
  assert_eq!(ok.body["body"], json!({"qty": 2}));
  assert_eq!(ok.body["method"], "POST");

  let failed = router
    .dispatch(HttpRequest::new("POST", "/orders").with_body(json!({"fail": true})))
    .await
    .unwrap();
  assert_eq!(failed.status, 500);
  assert_eq!(failed.body["errors"], json!(["only: boom"]));

  assert!(router.dispatch(HttpRequest::new("GET", "/orders")).await.is_none());
  assert_eq!(trigger.executions().len(), 2);
}

#[tokio::test]
async fn test_http_async_acknowledges() {
  let router = Arc::new(LocalRouter::new());
  let trigger = HttpTrigger::new(
    TriggerConfig::new(DispatchMode::Async).with_option("path", "/hook"),
  )
  .unwrap();

  trigger
    .register(
      Arc::new(StubRunner::default()),
      &Collaborators::new().with_router(router.clone()),
    )
    .await
    .unwrap();

  let response = router.dispatch(HttpRequest::new("GET", "/hook")).await.unwrap();
  assert_eq!(response.status, 202);
}

#[tokio::test]
async fn test_http_route_conflict() {
  let router = Arc::new(LocalRouter::new());
  let collaborators = Collaborators::new().with_router(router);
  let config = TriggerConfig::new(DispatchMode::Sync).with_option("path", "/same");

  let first = HttpTrigger::new(config.clone()).unwrap();
  let second = HttpTrigger::new(config).unwrap();
  first
    .register(Arc::new(StubRunner::default()), &collaborators)
    .await
    .unwrap();
  let result = second
    .register(Arc::new(StubRunner::default()), &collaborators)
    .await;

  assert!(matches!(result, Err(TriggerError::RouteConflict { .. })));
}

#[test]
fn test_registry_roundtrip() {
  let registry = TriggerRegistry::with_builtin();
  let def = TriggerDef {
    trigger_type: "http".to_string(),
    config: TriggerConfig::new(DispatchMode::Async)
      .with_option("method", "PUT")
      .with_option("path", "/x"),
  };

  let trigger = registry.create(&def).unwrap();
  assert_eq!(trigger.type_name(), "http");
  assert_eq!(trigger.to_def(), def);

  let unknown = registry.create(&TriggerDef {
    trigger_type: "cron".to_string(),
    config: TriggerConfig::default(),
  });
  assert!(matches!(unknown, Err(TriggerError::UnknownType(t)) if t == "cron"));
}
