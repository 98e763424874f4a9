use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{ConsumeRecord, PublishRecord};
use crate::message::Message;

/// Node lifecycle fields shared by `NodeInvoke`/`NodeRespond`/`NodeFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: Uuid,
    pub node_name: String,
    pub node_type: String,
    pub subscribed_topics: Vec<String>,
    pub publish_to_topics: Vec<String>,
}

/// Workflow lifecycle fields shared by `WorkflowInvoke`/`WorkflowRespond`/`WorkflowFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowIdentity {
    pub workflow_name: String,
    pub workflow_type: String,
}

/// Tool lifecycle fields shared by `ToolInvoke`/`ToolRespond`/`ToolFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolIdentity {
    pub tool_name: String,
}

/// The discriminated union of every event the engine can emit. Replaces
/// any runtime class hierarchy with a single tagged enum and explicit
/// serialization (spec §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A publish admitted onto an ordinary topic.
    PublishToTopic(PublishRecord),
    /// A consumer draining a publish from a topic.
    ConsumeFromTopic(ConsumeRecord),
    /// A publish restricted to a reserved output/human-request topic.
    /// Its payload may represent a finite stream of partial messages.
    OutputTopic(PublishRecord),

    NodeInvoke {
        #[serde(flatten)]
        identity: NodeIdentity,
        input_data: Vec<ConsumeRecord>,
    },
    NodeRespond {
        #[serde(flatten)]
        identity: NodeIdentity,
        output_data: Vec<Message>,
    },
    NodeFailed {
        #[serde(flatten)]
        identity: NodeIdentity,
        error: String,
    },

    WorkflowInvoke {
        #[serde(flatten)]
        identity: WorkflowIdentity,
        input_data: Vec<Message>,
    },
    WorkflowRespond {
        #[serde(flatten)]
        identity: WorkflowIdentity,
        output_data: Vec<Message>,
    },
    WorkflowFailed {
        #[serde(flatten)]
        identity: WorkflowIdentity,
        error: String,
    },

    ToolInvoke {
        #[serde(flatten)]
        identity: ToolIdentity,
        input_data: serde_json::Value,
    },
    ToolRespond {
        #[serde(flatten)]
        identity: ToolIdentity,
        output_data: serde_json::Value,
    },
    ToolFailed {
        #[serde(flatten)]
        identity: ToolIdentity,
        error: String,
    },
}

impl EventKind {
    /// The topic this event's publish/consume refers to, if any — used to
    /// drive the `on_event` readiness check without matching on the full
    /// variant at call sites.
    pub fn topic_name(&self) -> Option<&str> {
        match self {
            EventKind::PublishToTopic(r) | EventKind::OutputTopic(r) => Some(&r.topic_name),
            EventKind::ConsumeFromTopic(r) => Some(&r.topic_name),
            _ => None,
        }
    }
}
