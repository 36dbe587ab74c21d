//! Parameter schemas.
//!
//! A schema lists the parameters a task kind accepts and the type each one
//! decodes to. It is consulted twice:
//!
//! 1. At construction ([`ParamSchema::validate`]): unknown or missing
//!    parameters are rejected and literals are coerced. Template strings are
//!    accepted for any field since their type is only known after rendering.
//! 2. Before every run ([`ParamSchema::decode`]): the rendered parameters are
//!    coerced to their declared types, so `"{{ count }}"` declared as an
//!    integer reaches `execute` as a number.

use serde_json::Value;

use crate::error::TaskError;
use crate::task::Params;
use crate::template::is_template;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
  String,
  Number,
  Integer,
  Boolean,
  Null,
  Array,
  Object,
  Any,
}

impl ParamKind {
  fn from_type_name(type_name: &str) -> Self {
    match type_name {
      "string" => Self::String,
      "number" => Self::Number,
      "integer" => Self::Integer,
      "boolean" => Self::Boolean,
      "null" => Self::Null,
      "array" => Self::Array,
      "object" => Self::Object,
      _ => Self::Any,
    }
  }

  fn type_name(self) -> &'static str {
    match self {
      Self::String => "string",
      Self::Number => "number",
      Self::Integer => "integer",
      Self::Boolean => "boolean",
      Self::Null => "null",
      Self::Array => "array",
      Self::Object => "object",
      Self::Any => "any",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
  pub name: String,
  pub kind: ParamKind,
  pub required: bool,
  /// Passed to `execute` exactly as declared, without template rendering.
  pub verbatim: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
  fields: Vec<ParamField>,
}

impl ParamSchema {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a required parameter.
  pub fn required(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
    self.fields.push(ParamField {
      name: name.into(),
      kind,
      required: true,
      verbatim: false,
    });
    self
  }

  /// Add an optional parameter.
  pub fn optional(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
    self.fields.push(ParamField {
      name: name.into(),
      kind,
      required: false,
      verbatim: false,
    });
    self
  }

  /// Mark an already added parameter as verbatim: template markup in it is
  /// left for the task itself to interpret.
  pub fn verbatim(mut self, name: &str) -> Self {
    if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
      field.verbatim = true;
    }
    self
  }

  pub fn is_verbatim(&self, name: &str) -> bool {
    self.field(name).is_some_and(|f| f.verbatim)
  }

  /// Build a schema from a JSON Schema object.
  ///
  /// Only `properties` (with a simple `type`) and `required` are read.
  /// Properties without a type, or with a type we don't know, accept any value.
  pub fn from_json_schema(json_schema: &Value) -> Self {
    let required: Vec<&str> = json_schema
      .get("required")
      .and_then(|r| r.as_array())
      .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
      .unwrap_or_default();

    let mut schema = Self::new();
    if let Some(properties) = json_schema.get("properties").and_then(|p| p.as_object()) {
      for (name, prop_schema) in properties {
        let kind = prop_schema
          .get("type")
          .and_then(|t| t.as_str())
          .map(ParamKind::from_type_name)
          .unwrap_or(ParamKind::Any);
        schema.fields.push(ParamField {
          name: name.clone(),
          kind,
          required: required.contains(&name.as_str()),
          verbatim: false,
        });
      }
    }
    schema
  }

  pub fn fields(&self) -> &[ParamField] {
    &self.fields
  }

  pub fn field(&self, name: &str) -> Option<&ParamField> {
    self.fields.iter().find(|f| f.name == name)
  }

  /// Validate declared parameters. Template strings pass through untouched.
  pub fn validate(&self, task: &str, params: &Params) -> Result<Params, TaskError> {
    self.check(task, params, true)
  }

  /// Decode fully rendered parameters into their declared types.
  pub fn decode(&self, task: &str, params: &Params) -> Result<Params, TaskError> {
    self.check(task, params, false)
  }

  fn check(&self, task: &str, params: &Params, allow_templates: bool) -> Result<Params, TaskError> {
    for field in &self.fields {
      if field.required && !params.contains_key(&field.name) {
        return Err(TaskError::MissingParam {
          task: task.to_string(),
          param: field.name.clone(),
        });
      }
    }

    let mut decoded = Params::new();
    for (key, value) in params {
      let field = self.field(key).ok_or_else(|| TaskError::UnknownParam {
        task: task.to_string(),
        param: key.clone(),
      })?;

      let value = if allow_templates && is_template(value) {
        value.clone()
      } else {
        coerce_value(task, key, value, field.kind)?
      };
      decoded.insert(key.clone(), value);
    }

    Ok(decoded)
  }
}

/// Coerce a single value to a declared type.
///
/// Values already of the right type pass through; strings are parsed into
/// the target type.
fn coerce_value(task: &str, key: &str, value: &Value, kind: ParamKind) -> Result<Value, TaskError> {
  let invalid = |message: String| TaskError::InvalidParam {
    task: task.to_string(),
    param: key.to_string(),
    message,
  };

  match (kind, value) {
    (ParamKind::Any, v) => Ok(v.clone()),

    (ParamKind::String, Value::String(_)) => Ok(value.clone()),
    (ParamKind::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
    (ParamKind::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
    (ParamKind::String, v) => Err(invalid(format!("expected string, got {}", v))),

    (ParamKind::Number, Value::Number(_)) => Ok(value.clone()),
    (ParamKind::Number, Value::String(s)) => s
      .trim()
      .parse::<f64>()
      .ok()
      .and_then(serde_json::Number::from_f64)
      .map(Value::Number)
      .ok_or_else(|| invalid(format!("expected number, got '{}'", s))),

    (ParamKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
    (ParamKind::Integer, Value::String(s)) => s
      .trim()
      .parse::<i64>()
      .map(|n| Value::Number(n.into()))
      .map_err(|_| invalid(format!("expected integer, got '{}'", s))),

    (ParamKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
    (ParamKind::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
      "true" => Ok(Value::Bool(true)),
      "false" => Ok(Value::Bool(false)),
      _ => Err(invalid(format!("expected boolean, got '{}'", s))),
    },

    (ParamKind::Null, Value::Null) => Ok(Value::Null),
    (ParamKind::Null, Value::String(s)) if s.is_empty() || s == "null" => Ok(Value::Null),

    (ParamKind::Array, Value::Array(_)) => Ok(value.clone()),
    (ParamKind::Array, Value::String(s)) => match serde_json::from_str::<Value>(s) {
      Ok(parsed @ Value::Array(_)) => Ok(parsed),
      _ => Err(invalid(format!("expected array, got '{}'", s))),
    },

    (ParamKind::Object, Value::Object(_)) => Ok(value.clone()),
    (ParamKind::Object, Value::String(s)) => match serde_json::from_str::<Value>(s) {
      Ok(parsed @ Value::Object(_)) => Ok(parsed),
      _ => Err(invalid(format!("expected object, got '{}'", s))),
    },

    (kind, v) => Err(invalid(format!("expected {}, got {}", kind.type_name(), v))),
  }
}
