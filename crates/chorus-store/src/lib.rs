//! The event store contract (spec §6): `append`, `events_for_request`, and
//! `has_events_for_request`, plus two reference implementations. Every
//! workflow-engine crate depends on the trait, never on a concrete
//! backend, the way `agtrace-runtime` depends on `agtrace-index::Database`
//! only through the methods it calls.

mod error;
mod memory;
mod sqlite;

use chorus_types::Event;
use uuid::Uuid;

pub use error::StoreError;
pub use memory::InMemoryEventStore;
pub use sqlite::SqliteEventStore;

/// Append-only, per-request-readable log of every event a workflow ever
/// emits (spec §6). Implementations must preserve insertion order within
/// a request even though topics themselves impose no cross-topic order.
pub trait EventStore: Send + Sync {
    fn append(&self, event: Event) -> Result<(), StoreError>;

    fn events_for_request(&self, assistant_request_id: Uuid) -> Result<Vec<Event>, StoreError>;

    fn has_events_for_request(&self, assistant_request_id: Uuid) -> Result<bool, StoreError>;
}
