//! Trellis Config
//!
//! This crate contains the serializable flow definition types for trellis.
//! These types represent a task graph before it is rebuilt into a live
//! `Flow` by the engine.
//!
//! Definitions can be loaded from:
//! - JSON files (via the CLI, `trellis run flow.json`)
//! - Any host storage that keeps flows as JSON blobs
//!
//! Tasks and connections are kept in insertion order. Order matters: the
//! first task is the default start task and the last one is the default
//! responding task.

mod condition;
mod connection;
mod flow;
mod ordered;
mod task;
mod trigger;

pub use condition::ConditionDef;
pub use connection::{ConnectionConfig, ConnectionDef};
pub use flow::FlowDef;
pub use task::TaskDef;
pub use trigger::{DispatchMode, TriggerConfig, TriggerDef};
