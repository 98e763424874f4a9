//! Topics, the subscription DSL, the ancestor event graph, and node
//! readiness: the pure, synchronous core of the chorus workflow engine.
//! Nothing in this crate performs I/O or owns a store; `chorus-runtime`
//! wires these pieces into a running workflow.

mod ancestor;
mod command;
mod error;
mod node;
mod subscription;
mod topic;

pub use ancestor::{ancestor_messages, PublishCatalog};
pub use command::{Command, CommandError, FunctionSpec, StreamingCommand};
pub use error::{DanglingParentError, GraphError, ProtocolError};
pub use node::Node;
pub use subscription::Expr;
pub use topic::{AdmissionPredicate, Topic, TopicKind};
