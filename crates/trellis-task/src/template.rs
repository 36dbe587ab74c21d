//! Parameter resolution using minijinja templates.
//!
//! Every top-level parameter whose value is a string containing `{{` or `{%`
//! is rendered against the outputs of earlier tasks. The context is keyed by
//! task name:
//!
//! ```json
//! {
//!   "flow":  { "output": { "user_id": 7 }, "success": true },
//!   "fetch": { "output": { "email": "a@b.c" }, "success": true, "params": {} }
//! }
//! ```
//!
//! A value that is exactly one expression (`"{{ fetch.output }}"`) is
//! evaluated rather than rendered, so objects, arrays and numbers keep their
//! JSON shape. Anything else renders to a string. The task's schema then
//! decodes the result into the declared parameter types.

use minijinja::Environment;
use serde_json::{Value, json};

use crate::error::TaskError;
use crate::result::Inputs;
use crate::schema::ParamSchema;
use crate::task::Params;

const MARKERS: [&str; 2] = ["{{", "{%"];

/// Check if a parameter value carries template markup.
pub fn is_template(value: &Value) -> bool {
  value.as_str().is_some_and(is_template_str)
}

fn is_template_str(s: &str) -> bool {
  MARKERS.iter().any(|m| s.contains(m))
}

/// Build the template context from the inputs map.
pub fn build_context(inputs: &Inputs) -> Value {
  let ctx: serde_json::Map<String, Value> = inputs
    .iter()
    .map(|(name, result)| {
      (
        name.clone(),
        json!({
          "output": result.output,
          "success": result.success,
          "error": result.error,
          "params": result.params,
        }),
      )
    })
    .collect();
  Value::Object(ctx)
}

/// Resolve a task's declared parameters against the inputs map.
///
/// # Arguments
/// * `task` - Name of the task being resolved (for error messages)
/// * `schema` - The task kind's schema, if it declares one
/// * `raw` - Declared parameters (literals and template strings)
/// * `inputs` - Results of earlier tasks, keyed by task name
pub fn resolve_params(
  task: &str,
  schema: Option<&ParamSchema>,
  raw: &Params,
  inputs: &Inputs,
) -> Result<Params, TaskError> {
  let env = Environment::new();
  let ctx = minijinja::Value::from_serialize(build_context(inputs));

  let mut rendered = Params::new();
  for (key, value) in raw {
    let verbatim = schema.is_some_and(|s| s.is_verbatim(key));
    let value = match value.as_str() {
      Some(template) if !verbatim && is_template_str(template) => {
        render_value(&env, task, key, template, &ctx)?
      }
      _ => value.clone(),
    };
    rendered.insert(key.clone(), value);
  }

  match schema {
    Some(schema) => schema.decode(task, &rendered),
    None => Ok(rendered),
  }
}

fn render_value(
  env: &Environment,
  task: &str,
  param: &str,
  template: &str,
  ctx: &minijinja::Value,
) -> Result<Value, TaskError> {
  let template_error = |message: String| TaskError::Template {
    task: task.to_string(),
    param: param.to_string(),
    message,
  };

  if let Some(expr) = single_expression(template) {
    let expr = env
      .compile_expression(expr)
      .map_err(|e| template_error(e.to_string()))?;
    let value = expr.eval(ctx).map_err(|e| template_error(e.to_string()))?;
    return serde_json::to_value(&value).map_err(|e| template_error(e.to_string()));
  }

  env
    .render_str(template, ctx)
    .map(Value::String)
    .map_err(|e| template_error(e.to_string()))
}

/// Return the expression of a template made of a single `{{ ... }}` block.
fn single_expression(template: &str) -> Option<&str> {
  let inner = template.strip_prefix("{{")?.strip_suffix("}}")?;
  if is_template_str(inner) || inner.contains("}}") {
    return None;
  }
  Some(inner.trim())
}
