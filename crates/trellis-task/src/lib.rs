//! Trellis Task
//!
//! A [`Task`] is a named, schema-validated unit of work. Its parameters may
//! hold literal values or minijinja template strings; templates are rendered
//! against the outputs of earlier tasks right before each run, then coerced
//! to the types declared in the task's [`ParamSchema`].
//!
//! Concrete behaviour lives behind the [`TaskKind`] trait. A `Task` pairs a
//! kind with a name and declared parameters and is never mutated by a run:
//! [`Task::run`] builds a resolved clone and executes that instead.

mod error;
mod registry;
mod result;
mod schema;
mod task;
mod template;

pub use error::TaskError;
pub use registry::TaskRegistry;
pub use result::{ErrorInfo, Inputs, TaskResult};
pub use schema::{ParamField, ParamKind, ParamSchema};
pub use task::{Params, Task, TaskKind};
pub use template::{build_context, is_template, resolve_params};
