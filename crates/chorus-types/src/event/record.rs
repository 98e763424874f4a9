use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

/// Which kind of workflow participant published or consumed a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Node,
    Workflow,
    Facade,
}

/// Shared shape of a topic publication: a batch of messages admitted onto
/// a topic at a given offset, with its causal parents recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub topic_name: String,
    pub offset: u64,
    pub data: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumed_event_ids: Vec<Uuid>,
    pub publisher_name: String,
    pub publisher_type: ParticipantKind,
}

/// Shared shape of a topic consumption: the slice of publications a
/// consumer drained from a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeRecord {
    pub topic_name: String,
    pub offset: u64,
    pub data: Vec<Message>,
    pub consumer_name: String,
    pub consumer_type: ParticipantKind,
}
