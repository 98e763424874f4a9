//! Core wire types shared across the chorus workflow engine: the
//! conversational `Message`, the per-request `InvokeContext`, and the
//! `Event` taxonomy the event store persists.

mod invoke_context;
mod message;

pub mod event;

pub use event::{
    ConsumeRecord, Event, EventKind, NodeIdentity, ParticipantKind, PublishRecord, ToolIdentity,
    WorkflowIdentity,
};
pub use invoke_context::InvokeContext;
pub use message::{Content, Message, Role, ToolCallRequest};
