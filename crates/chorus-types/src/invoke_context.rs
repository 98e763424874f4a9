use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-request correlation bundle attached to every event. The primary
/// correlation key is `assistant_request_id` — the event store is keyed by
/// it, and restoration replays exactly the events carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeContext {
    pub assistant_request_id: Uuid,
    pub conversation_id: Uuid,
    pub invoke_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl InvokeContext {
    pub fn new(assistant_request_id: Uuid, conversation_id: Uuid, invoke_id: Uuid) -> Self {
        Self {
            assistant_request_id,
            conversation_id,
            invoke_id,
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Derive a follow-up context for the same request with a fresh
    /// `invoke_id`, used when a human-in-the-loop reply resumes dispatch.
    pub fn next_invoke(&self, invoke_id: Uuid) -> Self {
        Self {
            invoke_id,
            ..self.clone()
        }
    }
}
