use std::collections::HashMap;
use std::sync::Mutex;

use chorus_types::Event;
use uuid::Uuid;

use crate::error::StoreError;
use crate::EventStore;

struct Inner {
    events: Vec<Event>,
    by_request: HashMap<Uuid, Vec<usize>>,
    next_sequence: u64,
}

/// Default [`EventStore`] backend: a `Mutex`-guarded `Vec<Event>` plus a
/// per-request index, used pervasively in tests and as the default for
/// workflows that don't need durability across process restarts.
pub struct InMemoryEventStore {
    inner: Mutex<Inner>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Vec::new(),
                by_request: HashMap::new(),
                next_sequence: 0,
            }),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, mut event: Event) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("InMemoryEventStore".to_string()))?;

        event.sequence = Some(inner.next_sequence);
        inner.next_sequence += 1;

        let index = inner.events.len();
        let request_id = event.invoke_context.assistant_request_id;
        inner.events.push(event);
        inner.by_request.entry(request_id).or_default().push(index);
        Ok(())
    }

    fn events_for_request(&self, assistant_request_id: Uuid) -> Result<Vec<Event>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("InMemoryEventStore".to_string()))?;

        Ok(inner
            .by_request
            .get(&assistant_request_id)
            .map(|indices| indices.iter().map(|&i| inner.events[i].clone()).collect())
            .unwrap_or_default())
    }

    fn has_events_for_request(&self, assistant_request_id: Uuid) -> Result<bool, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("InMemoryEventStore".to_string()))?;
        Ok(inner
            .by_request
            .get(&assistant_request_id)
            .map(|indices| !indices.is_empty())
            .unwrap_or(false))
    }
}
