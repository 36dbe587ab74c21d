//! Trellis Trigger
//!
//! A trigger binds an external event source to flow runs. Triggers never see
//! a flow directly: they are handed a [`FlowRunner`] and call
//! [`FlowRunner::run`] whenever their source fires, recording the
//! resulting [`ExecutionReport`]s.
//!
//! # Kinds
//!
//! - [`ManualTrigger`] (`"manual"`) runs once when registered.
//! - [`EventTrigger`] (`"event"`) subscribes to a named event on an [`EventBus`].
//! - [`HttpTrigger`] (`"http"`) serves a `(method, path)` route on an [`HttpRouter`].
//!
//! [`LocalEventBus`] and [`LocalRouter`] are in-process collaborators for
//! hosts without their own event bus or http server.

mod bus;
mod error;
mod event;
mod history;
mod http;
mod manual;
mod registry;
mod report;
mod router;
mod trigger;

pub use bus::{EventBus, EventHandler, LocalEventBus};
pub use error::TriggerError;
pub use event::EventTrigger;
pub use history::ExecutionHistory;
pub use http::{HttpTrigger, ResponseType};
pub use manual::ManualTrigger;
pub use registry::{TriggerConstructor, TriggerRegistry};
pub use report::{ExecutionReport, LogRecord};
pub use router::{HttpHandler, HttpRequest, HttpResponse, HttpRouter, LocalRouter};
pub use trigger::{Collaborators, FlowRunner, Trigger};
