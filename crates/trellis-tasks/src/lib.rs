//! Trellis Tasks
//!
//! Built-in [`TaskKind`](trellis_task::TaskKind)s:
//!
//! | type       | params                                             | output                      |
//! |------------|----------------------------------------------------|-----------------------------|
//! | `log`      | `message`, `level?`                                | `{ message }`               |
//! | `render`   | `template`, `data?`                                | rendered string             |
//! | `fetch`    | `url`, `method?`, `headers?`, `body?`, `response_type?` | `{ status, headers, body }` |
//! | `sub-flow` | `input?`                                           | the sub-flow's response     |
//!
//! `sub-flow` wraps a concrete flow, so it is registered per flow with
//! [`SubFlow`] rather than by [`register_builtin`].

mod fetch;
mod log;
mod render;
mod sub_flow;

pub use fetch::Fetch;
pub use log::Log;
pub use render::Render;
pub use sub_flow::SubFlow;

use trellis_task::TaskRegistry;

/// Register the `log`, `render` and `fetch` kinds.
pub fn register_builtin(registry: &mut TaskRegistry) -> &mut TaskRegistry {
  registry
    .register(Log::new())
    .register(Render::new())
    .register(Fetch::new())
}

/// A registry holding the built-in kinds.
pub fn builtin_registry() -> TaskRegistry {
  let mut registry = TaskRegistry::new();
  register_builtin(&mut registry);
  registry
}
