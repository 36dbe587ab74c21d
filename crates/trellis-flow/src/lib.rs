//! Trellis Flow
//!
//! A [`Flow`] is a directed graph of named [`Task`](trellis_task::Task)s
//! wired together by [`Connection`]s. Each connection carries a
//! [`Condition`] over the source task's result and a retry bound, which is
//! enough to express fan-out, joins, conditional branches and bounded retry
//! loops (back-edges).
//!
//! # Architecture
//!
//! ```text
//! Flow
//! ├── add_task / add_connection / set_responding_task   (definition time)
//! ├── sequence()        - BFS layering from the start task
//! ├── to_def / from_def - serialized form (trellis-config)
//! └── start(input) -> Execution
//!
//! Execution
//! └── start(input) - runs ready batches concurrently until nothing is ready
//!                    or the responding task has finished
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut flow = Flow::new("orders");
//! let fetch = flow.add_task(Task::new("fetch", Fetch, params)?)?;
//! let store = flow.add_task(Task::new("store", Store, params)?)?;
//! flow.connect(fetch, store)?;
//!
//! let execution = flow.start(json!({ "id": 7 })).await?;
//! println!("{:?}", execution.response());
//! ```

mod condition;
mod connection;
mod definition;
mod error;
mod events;
mod execution;
mod flow;
mod runner;
mod sequence;

pub use condition::Condition;
pub use connection::{Connection, TaskId};
pub use error::{ExecutionError, FlowError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use execution::{Execution, ExecutionState, LogEntry};
pub use flow::{Flow, FlowWarning};
pub use sequence::Sequence;
