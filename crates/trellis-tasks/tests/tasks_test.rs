//! Integration tests for the built-in task kinds.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use trellis_flow::Flow;
use trellis_task::{Inputs, Params, Task, TaskResult};
use trellis_tasks::{Fetch, Log, Render, SubFlow, builtin_registry};
use trellis_trigger::TriggerRegistry;

fn params(value: Value) -> Params {
  value.as_object().cloned().unwrap()
}

fn inputs_with_flow(input: Value) -> Inputs {
  let mut inputs = Inputs::new();
  inputs.insert("flow".to_string(), TaskResult::flow_input(input));
  inputs
}

/// Serve a single canned HTTP response and return the server's base URL.
async fn serve_once(status_line: &'static str, content_type: &'static str, body: &'static str) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();

  tokio::spawn(async move {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut buf = [0u8; 4096];
    let _ = socket.read(&mut buf).await;
    let response = format!(
      "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nx-served-by: test\r\nconnection: close\r\n\r\n{}",
      status_line,
      content_type,
      body.len(),
      body
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    let _ = socket.shutdown().await;
  });

  format!("http://{}/items", addr)
}

fn fetch_kind() -> Fetch {
  Fetch::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

// -- log --

#[tokio::test]
async fn test_log_outputs_message() {
  let task = Task::new(
    "log",
    Log::new(),
    params(json!({ "message": "hello {{ flow.output.name }}", "level": "warn" })),
  )
  .unwrap();

  let result = task.run(&inputs_with_flow(json!({ "name": "ada" }))).await;

  assert!(result.success);
  assert_eq!(result.output, Some(json!({ "message": "hello ada" })));
}

#[tokio::test]
async fn test_log_rejects_unknown_level() {
  let task = Task::new(
    "log",
    Log::new(),
    params(json!({ "message": "hi", "level": "loud" })),
  )
  .unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(!result.success);
  assert!(result.error.unwrap().message.contains("loud"));
}

#[test]
fn test_log_requires_message() {
  assert!(Task::new("log", Log::new(), Params::new()).is_err());
}

// -- render --

#[tokio::test]
async fn test_render_with_data() {
  let task = Task::new(
    "render",
    Render::new(),
    params(json!({
      "template": "{% for item in items %}{{ item }},{% endfor %}",
      "data": { "items": [1, 2, 3] }
    })),
  )
  .unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(result.success);
  assert_eq!(result.output, Some(json!("1,2,3,")));
  // The template is kept as declared.
  assert_eq!(
    result.params["template"],
    "{% for item in items %}{{ item }},{% endfor %}"
  );
}

#[tokio::test]
async fn test_render_against_inputs() {
  let task = Task::new(
    "render",
    Render::new(),
    params(json!({ "template": "Dear {{ flow.output.name | title }}" })),
  )
  .unwrap();

  let result = task.run(&inputs_with_flow(json!({ "name": "ada lovelace" }))).await;

  assert_eq!(result.output, Some(json!("Dear Ada Lovelace")));
}

#[tokio::test]
async fn test_render_syntax_error_fails_task() {
  let task = Task::new(
    "render",
    Render::new(),
    params(json!({ "template": "{{ broken" })),
  )
  .unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(!result.success);
  assert_eq!(result.error.unwrap().kind, "execution");
}

// -- fetch --

#[tokio::test]
async fn test_fetch_json() {
  let url = serve_once("200 OK", "application/json", r#"{"id":7,"tags":["a"]}"#).await;
  let task = Task::new("fetch", fetch_kind(), params(json!({ "url": url }))).unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(result.success, "{:?}", result.error);
  let output = result.output.unwrap();
  assert_eq!(output["status"], 200);
  assert_eq!(output["body"], json!({ "id": 7, "tags": ["a"] }));
  assert_eq!(output["headers"]["x-served-by"], "test");
}

#[tokio::test]
async fn test_fetch_text() {
  let url = serve_once("200 OK", "application/json", r#"{"id":7}"#).await;
  let task = Task::new(
    "fetch",
    fetch_kind(),
    params(json!({ "url": url, "method": "get", "response_type": "text" })),
  )
  .unwrap();

  let result = task.run(&Inputs::new()).await;

  assert_eq!(result.output.unwrap()["body"], r#"{"id":7}"#);
}

#[tokio::test]
async fn test_fetch_non_json_body_falls_back_to_string() {
  let url = serve_once("200 OK", "text/plain", "plain text").await;
  let task = Task::new("fetch", fetch_kind(), params(json!({ "url": url }))).unwrap();

  let result = task.run(&Inputs::new()).await;

  assert_eq!(result.output.unwrap()["body"], "plain text");
}

#[tokio::test]
async fn test_fetch_error_status_fails_task() {
  let url = serve_once("404 Not Found", "text/plain", "missing").await;
  let task = Task::new("fetch", fetch_kind(), params(json!({ "url": url }))).unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(!result.success);
  assert!(result.error.unwrap().message.contains("404"));
}

#[tokio::test]
async fn test_fetch_unsupported_method() {
  let task = Task::new(
    "fetch",
    fetch_kind(),
    params(json!({ "url": "http://127.0.0.1:9/", "method": "BREW" })),
  )
  .unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(!result.success);
  assert!(result.error.unwrap().message.contains("BREW"));
}

// -- sub-flow --

fn greeting_flow(level: &str) -> Arc<Flow> {
  let mut flow = Flow::new("greet");
  let log = Task::new(
    "say",
    Log::new(),
    params(json!({ "message": "hi {{ flow.output.name }}", "level": level })),
  )
  .unwrap();
  flow.add_task(log).unwrap();
  Arc::new(flow)
}

#[tokio::test]
async fn test_sub_flow_outputs_response() {
  let task = Task::new(
    "child",
    SubFlow::new(greeting_flow("info")),
    params(json!({ "input": "{{ flow.output }}" })),
  )
  .unwrap();

  let result = task.run(&inputs_with_flow(json!({ "name": "ada" }))).await;

  assert!(result.success, "{:?}", result.error);
  assert_eq!(result.output, Some(json!({ "message": "hi ada" })));
}

#[tokio::test]
async fn test_sub_flow_failure_fails_task() {
  let task = Task::new("child", SubFlow::new(greeting_flow("loud")), Params::new()).unwrap();

  let result = task.run(&Inputs::new()).await;

  assert!(!result.success);
  let message = result.error.unwrap().message;
  assert!(message.contains("greet"));
  assert!(message.contains("say"));
}

#[tokio::test]
async fn test_sub_flow_inside_flow() {
  let mut registry = builtin_registry();
  registry.register(SubFlow::with_type("greet", greeting_flow("debug")));

  let json = json!({
    "trigger": { "type": "manual" },
    "tasks": {
      "start": { "type": "log", "params": { "message": "starting" } },
      "greet": { "type": "greet", "params": { "input": { "name": "grace" } } },
      "summary": {
        "type": "render",
        "params": { "template": "{{ greet.output.message }}!" }
      }
    },
    "connections": {
      "c1": { "source": "start", "target": "greet" },
      "c2": { "source": "greet", "target": "summary" }
    },
    "start_task": "start"
  })
  .to_string();

  let flow = Flow::from_json("outer", &json, &registry, &TriggerRegistry::with_builtin()).unwrap();
  let execution = flow.start(Value::Null).await.unwrap();

  assert!(!execution.has_errors());
  assert_eq!(execution.response(), Some(&json!("hi grace!")));
}

#[test]
fn test_builtin_registry() {
  let registry = builtin_registry();
  assert_eq!(registry.types(), vec!["fetch", "log", "render"]);
}
