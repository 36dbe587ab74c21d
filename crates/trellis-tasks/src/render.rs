use async_trait::async_trait;
use minijinja::Environment;
use serde_json::Value;
use trellis_task::{Inputs, ParamKind, ParamSchema, Params, TaskError, TaskKind, build_context};

/// Renders a minijinja template.
///
/// The template is rendered against `data` when given, otherwise against the
/// same context parameter templates see (`{ <task>: { output, ... } }`).
pub struct Render {
  schema: ParamSchema,
}

impl Render {
  pub fn new() -> Self {
    Self {
      schema: ParamSchema::new()
        .required("template", ParamKind::String)
        .verbatim("template")
        .optional("data", ParamKind::Any),
    }
  }
}

impl Default for Render {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl TaskKind for Render {
  fn type_name(&self) -> &str {
    "render"
  }

  fn schema(&self) -> Option<&ParamSchema> {
    Some(&self.schema)
  }

  async fn execute(&self, params: &Params, inputs: &Inputs) -> Result<Value, TaskError> {
    let template = params
      .get("template")
      .and_then(Value::as_str)
      .unwrap_or_default();
    let data = match params.get("data") {
      Some(data) => data.clone(),
      None => build_context(inputs),
    };

    let env = Environment::new();
    env
      .render_str(template, minijinja::Value::from_serialize(&data))
      .map(Value::String)
      .map_err(|e| TaskError::execution(format!("failed to render template: {}", e)))
  }
}
