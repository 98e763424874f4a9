//! The chorus workflow engine: builds a validated graph from topics and
//! nodes, initializes or restores per-request state, drives dispatch in
//! either the cooperative or parallel mode, and exposes the
//! assistant-facing façade a CLI or service sits behind.

pub mod cancellation;
mod config;
pub mod dispatch;
mod error;
mod facade;
mod graph;
pub mod reserved;
mod workflow;

pub use cancellation::CancellationToken;
pub use config::{Config, DispatchMode};
pub use error::{Error, Result};
pub use facade::Facade;
pub use graph::WorkflowBuilder;
pub use workflow::{DispatchTicket, Workflow};
