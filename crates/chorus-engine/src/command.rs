use std::fmt;

use chorus_types::{ConsumeRecord, InvokeContext, Message};

/// Name and JSON-schema-shaped description of a callable a command exposes
/// to an LLM backend — opaque to the engine beyond propagation (spec §9:
/// "the engine treats function specs as opaque data to propagate").
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Errors raised by a command's own execution, surfaced to the engine as
/// `NodeFailed`/`ToolFailed`/`WorkflowFailed` events rather than retried or
/// interpreted by the dispatcher.
#[derive(Debug, Clone)]
pub struct CommandError(pub String);

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CommandError {}

impl From<String> for CommandError {
    fn from(value: String) -> Self {
        CommandError(value)
    }
}

impl From<&str> for CommandError {
    fn from(value: &str) -> Self {
        CommandError(value.to_string())
    }
}

/// The opaque boundary between the engine and a node's actual
/// implementation — an LLM call, a tool invocation, a sub-workflow. The
/// engine never inspects what a command does; it supplies the ancestor
/// messages reconstructed for this invocation and takes back zero or more
/// output messages (spec §4.4, §9).
pub trait Command: Send + Sync {
    fn run(
        &self,
        ctx: &InvokeContext,
        input: &[ConsumeRecord],
    ) -> Result<Vec<Message>, CommandError>;
}

/// Variant of [`Command`] for nodes that produce output incrementally. The
/// engine consumes the iterator to completion before recording the
/// `NodeRespond` event; a lazy iterator rather than a future, since the
/// engine carries no async runtime (spec §9).
pub trait StreamingCommand: Send + Sync {
    fn run_streaming(
        &self,
        ctx: &InvokeContext,
        input: &[ConsumeRecord],
    ) -> Result<Box<dyn Iterator<Item = Message>>, CommandError>;
}
