use std::fmt;

use chorus_engine::{CommandError, GraphError, ProtocolError};
use chorus_store::StoreError;

/// Result type for chorus-runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving a [`crate::Workflow`].
#[derive(Debug)]
pub enum Error {
    /// Graph construction/validation failure (spec §7, fatal at construction).
    Graph(GraphError),

    /// Runtime topic-protocol violation (spec §7, fatal to the current request).
    Protocol(ProtocolError),

    /// A node's command failed during dispatch.
    Command(CommandError),

    /// Event store error.
    Store(StoreError),

    /// IO operation failed (config load/save).
    Io(std::io::Error),

    /// Configuration error.
    Config(String),

    /// The request is not in a state the requested operation permits.
    InvalidOperation(String),

    /// The request was cancelled before its dispatch loop finished draining
    /// (spec §5); a `WorkflowFailed` event has already been recorded.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Graph(err) => write!(f, "graph error: {err}"),
            Error::Protocol(err) => write!(f, "protocol error: {err}"),
            Error::Command(err) => write!(f, "command error: {err}"),
            Error::Store(err) => write!(f, "event store error: {err}"),
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            Error::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Graph(err) => Some(err),
            Error::Protocol(err) => Some(err),
            Error::Command(err) => Some(err),
            Error::Store(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) | Error::InvalidOperation(_) | Error::Cancelled => None,
        }
    }
}

impl From<GraphError> for Error {
    fn from(err: GraphError) -> Self {
        Error::Graph(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        Error::Command(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
