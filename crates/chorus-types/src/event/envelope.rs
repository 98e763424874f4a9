use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::EventKind;
use crate::invoke_context::InvokeContext;

/// An event as it is recorded in the event store: the common envelope
/// (`event_id`, `timestamp`, `invoke_context`) around a tagged [`EventKind`].
///
/// `sequence` is the store's own monotonically increasing insertion
/// counter, independent of any per-topic offset. Topics have no ordering
/// relationship with each other (spec §5), but a single request's replay
/// needs *some* total order to be deterministic — `sequence` provides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub timestamp: i64,
    pub invoke_context: InvokeContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(event_id: Uuid, timestamp: i64, invoke_context: InvokeContext, kind: EventKind) -> Self {
        Self {
            event_id,
            timestamp,
            invoke_context,
            sequence: None,
            kind,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}
