use std::fmt;
use uuid::Uuid;

/// Errors discovered at graph build/validation time. Fatal at construction
/// — spec §7: "Graph error... Fatal at construction."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNodeName(String),
    DuplicateTopicName(String),
    UnknownSubscribedTopic { node: String, topic: String },
    UnknownPublishTopic { node: String, topic: String },
    MissingReservedTopic(String),
    OutputTopicHasUnexpectedPublisher { topic: String, node: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateNodeName(name) => write!(f, "duplicate node name: {name}"),
            GraphError::DuplicateTopicName(name) => write!(f, "duplicate topic name: {name}"),
            GraphError::UnknownSubscribedTopic { node, topic } => write!(
                f,
                "node {node} subscribes to unknown topic {topic}"
            ),
            GraphError::UnknownPublishTopic { node, topic } => {
                write!(f, "node {node} publishes to unknown topic {topic}")
            }
            GraphError::MissingReservedTopic(name) => {
                write!(f, "missing reserved topic: {name}")
            }
            GraphError::OutputTopicHasUnexpectedPublisher { topic, node } => write!(
                f,
                "node {node} is not a designated producer for output topic {topic}"
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// Runtime violations of the topic contract. Fatal to the current request
/// — spec §7: "Protocol error... Fatal to the current request."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownParent(Uuid),
    ParentNotDelivered(Uuid),
    NotHumanRequestTopic(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownParent(id) => {
                write!(f, "append_user_input: no such parent publish event {id}")
            }
            ProtocolError::ParentNotDelivered(id) => write!(
                f,
                "append_user_input: parent output event {id} has not been delivered"
            ),
            ProtocolError::NotHumanRequestTopic(name) => {
                write!(f, "topic {name} does not accept append_user_input")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// A dangling `consumed_event_ids` reference discovered while reconstructing
/// the ancestor graph. A data-integrity error — spec §4.3: "raise fatally;
/// do not silently skip."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingParentError(pub Uuid);

impl fmt::Display for DanglingParentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dangling causal parent reference: {}", self.0)
    }
}

impl std::error::Error for DanglingParentError {}
