mod envelope;
mod kind;
mod record;

pub use envelope::Event;
pub use kind::{EventKind, NodeIdentity, ToolIdentity, WorkflowIdentity};
pub use record::{ConsumeRecord, ParticipantKind, PublishRecord};
