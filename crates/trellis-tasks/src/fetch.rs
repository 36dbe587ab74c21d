use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tracing::debug;
use trellis_task::{Inputs, ParamKind, ParamSchema, Params, TaskError, TaskKind};

/// Performs an HTTP request.
///
/// Output is `{ status, headers, body }`. With `response_type: "json"` (the
/// default) a body that is not valid JSON is returned as a string. Non-2xx
/// statuses fail the task.
pub struct Fetch {
  client: Client,
  schema: ParamSchema,
}

impl Fetch {
  pub fn new() -> Self {
    Self::with_client(Client::new())
  }

  pub fn with_client(client: Client) -> Self {
    Self {
      client,
      schema: ParamSchema::new()
        .required("url", ParamKind::String)
        .optional("method", ParamKind::String)
        .optional("headers", ParamKind::Object)
        .optional("body", ParamKind::Any)
        .optional("response_type", ParamKind::String),
    }
  }
}

impl Default for Fetch {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl TaskKind for Fetch {
  fn type_name(&self) -> &str {
    "fetch"
  }

  fn schema(&self) -> Option<&ParamSchema> {
    Some(&self.schema)
  }

  async fn execute(&self, params: &Params, _inputs: &Inputs) -> Result<Value, TaskError> {
    let url = params.get("url").and_then(Value::as_str).unwrap_or_default();
    let method = parse_method(params.get("method").and_then(Value::as_str).unwrap_or("GET"))?;
    let text_response = match params.get("response_type").and_then(Value::as_str) {
      None | Some("json") => false,
      Some("text") => true,
      Some(other) => {
        return Err(TaskError::execution(format!(
          "unsupported response type '{}', expected json or text",
          other
        )));
      }
    };

    let mut request = self.client.request(method.clone(), url);

    if let Some(headers) = params.get("headers").and_then(Value::as_object) {
      for (key, value) in headers {
        let value = match value {
          Value::String(s) => s.clone(),
          other => other.to_string(),
        };
        request = request.header(key.as_str(), value);
      }
    }

    match params.get("body") {
      None | Some(Value::Null) => {}
      Some(Value::String(body)) => request = request.body(body.clone()),
      Some(body) => request = request.json(body),
    }

    debug!(%method, url, "sending request");
    let response = request
      .send()
      .await
      .map_err(|e| TaskError::execution(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    let headers: BTreeMap<String, String> = response
      .headers()
      .iter()
      .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
      .collect();

    let text = response
      .text()
      .await
      .map_err(|e| TaskError::execution(format!("failed to read response from {}: {}", url, e)))?;

    if !status.is_success() {
      return Err(TaskError::execution(format!(
        "request to {} returned status {}",
        url,
        status.as_u16()
      )));
    }

    let body = if text_response {
      Value::String(text)
    } else {
      serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    Ok(json!({
      "status": status.as_u16(),
      "headers": headers,
      "body": body,
    }))
  }
}

fn parse_method(method: &str) -> Result<Method, TaskError> {
  match method.to_uppercase().as_str() {
    "GET" => Ok(Method::GET),
    "POST" => Ok(Method::POST),
    "PUT" => Ok(Method::PUT),
    "DELETE" => Ok(Method::DELETE),
    "PATCH" => Ok(Method::PATCH),
    "HEAD" => Ok(Method::HEAD),
    "OPTIONS" => Ok(Method::OPTIONS),
    _ => Err(TaskError::execution(format!(
      "unsupported HTTP method: {}",
      method
    ))),
  }
}
