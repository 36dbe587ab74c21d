use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::json;
use tracing::info;
use trellis_config::{DispatchMode, TriggerConfig};

use crate::error::TriggerError;
use crate::history::ExecutionHistory;
use crate::report::ExecutionReport;
use crate::router::{HttpHandler, HttpRequest, HttpResponse};
use crate::trigger::{Collaborators, FlowRunner, Trigger};

/// How a flow response is rendered onto the http response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
  Json,
  Text,
}

impl ResponseType {
  fn parse(value: &str) -> Result<Self, TriggerError> {
    match value {
      "json" => Ok(Self::Json),
      "text" => Ok(Self::Text),
      other => Err(TriggerError::InvalidConfig(format!(
        "unsupported response_type '{}'",
        other
      ))),
    }
  }

  fn render(self, response: Option<serde_json::Value>) -> HttpResponse {
    match self {
      Self::Json => HttpResponse::json(200, response.unwrap_or(serde_json::Value::Null)),
      Self::Text => {
        let body = match response {
          Some(serde_json::Value::String(s)) => s,
          Some(serde_json::Value::Null) | None => String::new(),
          Some(other) => other.to_string(),
        };
        HttpResponse::text(200, body)
      }
    }
  }
}

/// Serves a flow on an http route. The raw request is the run input.
///
/// Config options: `method` (default `GET`), `path` (required) and
/// `response_type` (`json` or `text`, default `json`).
#[derive(Debug, Clone)]
pub struct HttpTrigger {
  config: TriggerConfig,
  method: String,
  path: String,
  response_type: ResponseType,
  history: ExecutionHistory,
}

impl HttpTrigger {
  pub fn new(config: TriggerConfig) -> Result<Self, TriggerError> {
    let method = config.option_str("method").unwrap_or("GET").to_uppercase();
    let path = config
      .option_str("path")
      .filter(|p| p.starts_with('/'))
      .ok_or_else(|| {
        TriggerError::InvalidConfig("http trigger requires a 'path' starting with '/'".to_string())
      })?
      .to_string();
    let response_type = ResponseType::parse(config.option_str("response_type").unwrap_or("json"))?;

    Ok(Self {
      config,
      method,
      path,
      response_type,
      history: ExecutionHistory::new(),
    })
  }

  pub fn method(&self) -> &str {
    &self.method
  }

  pub fn path(&self) -> &str {
    &self.path
  }
}

#[async_trait]
impl Trigger for HttpTrigger {
  fn type_name(&self) -> &str {
    "http"
  }

  fn config(&self) -> &TriggerConfig {
    &self.config
  }

  async fn register(
    &self,
    runner: Arc<dyn FlowRunner>,
    collaborators: &Collaborators,
  ) -> Result<(), TriggerError> {
    let router = collaborators
      .router
      .as_ref()
      .ok_or_else(|| TriggerError::MissingCollaborator {
        trigger_type: self.type_name().to_string(),
        collaborator: "http router",
      })?;

    let history = self.history.clone();
    let mode = self.config.mode;
    let response_type = self.response_type;

    let handler: HttpHandler = Arc::new(move |request: HttpRequest| {
      let runner = runner.clone();
      let history = history.clone();
      async move {
        info!(method = %request.method, path = %request.path, ?mode, "http trigger firing");
        let input = serde_json::to_value(&request).unwrap_or(serde_json::Value::Null);

        match mode {
          DispatchMode::Sync => {
            let report = runner.run(input).await;
            let response = if report.failed() {
              HttpResponse::json(500, json!({ "errors": report.error_messages() }))
            } else {
              response_type.render(report.response.clone())
            };
            history.record(report);
            response
          }
          DispatchMode::Async => {
            tokio::spawn(async move {
              history.record(runner.run(input).await);
            });
            HttpResponse::json(202, json!({ "status": "accepted" }))
          }
        }
      }
      .boxed()
    });

    router.route(&self.method, &self.path, handler)
  }

  fn executions(&self) -> Vec<ExecutionReport> {
    self.history.snapshot()
  }
}
