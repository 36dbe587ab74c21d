//! HTTP router collaborator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::TriggerError;

/// An incoming request, as handed to a flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
  pub method: String,
  pub path: String,
  #[serde(default)]
  pub headers: Vec<(String, String)>,
  #[serde(default)]
  pub query: HashMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body: Option<serde_json::Value>,
}

impl HttpRequest {
  pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      method: method.into(),
      path: path.into(),
      ..Self::default()
    }
  }

  pub fn with_body(mut self, body: serde_json::Value) -> Self {
    self.body = Some(body);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
  pub status: u16,
  pub content_type: String,
  pub body: serde_json::Value,
}

impl HttpResponse {
  pub fn json(status: u16, body: serde_json::Value) -> Self {
    Self {
      status,
      content_type: "application/json".to_string(),
      body,
    }
  }

  pub fn text(status: u16, body: impl Into<String>) -> Self {
    Self {
      status,
      content_type: "text/plain".to_string(),
      body: serde_json::Value::String(body.into()),
    }
  }
}

/// Request handler registered on a router.
pub type HttpHandler = Arc<dyn Fn(HttpRequest) -> BoxFuture<'static, HttpResponse> + Send + Sync>;

/// What the http trigger needs from an http server.
pub trait HttpRouter: Send + Sync {
  /// Register `handler` for `(method, path)`.
  fn route(&self, method: &str, path: &str, handler: HttpHandler) -> Result<(), TriggerError>;
}

/// In-process router keyed by exact method and path.
#[derive(Default)]
pub struct LocalRouter {
  routes: Mutex<HashMap<(String, String), HttpHandler>>,
}

impl LocalRouter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Dispatch a request. Returns `None` if no route matches.
  pub async fn dispatch(&self, request: HttpRequest) -> Option<HttpResponse> {
    let key = (request.method.to_uppercase(), request.path.clone());
    let handler = self
      .routes
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&key)
      .cloned()?;
    Some(handler(request).await)
  }
}

impl HttpRouter for LocalRouter {
  fn route(&self, method: &str, path: &str, handler: HttpHandler) -> Result<(), TriggerError> {
    let key = (method.to_uppercase(), path.to_string());
    let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
    if routes.contains_key(&key) {
      return Err(TriggerError::RouteConflict {
        method: key.0,
        path: key.1,
      });
    }
    routes.insert(key, handler);
    Ok(())
  }
}
