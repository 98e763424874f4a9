use std::path::Path;
use std::sync::Mutex;

use chorus_types::Event;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::StoreError;
use crate::EventStore;

/// Durable [`EventStore`] backend: one `events` table keyed by an
/// autoincrementing `sequence`, storing each event as JSON alongside its
/// request id for fast per-request retrieval — schema-on-read, the same
/// shape as the teacher's session index.
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("SqliteEventStore".to_string()))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                sequence INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_request ON events(request_id, sequence);
            "#,
        )?;
        Ok(())
    }
}

impl EventStore for SqliteEventStore {
    fn append(&self, mut event: Event) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("SqliteEventStore".to_string()))?;

        let request_id = event.invoke_context.assistant_request_id.to_string();
        event.sequence = None;
        let event_json = serde_json::to_string(&event)?;

        conn.execute(
            "INSERT INTO events (request_id, event_json) VALUES (?1, ?2)",
            params![&request_id, &event_json],
        )?;
        Ok(())
    }

    fn events_for_request(&self, assistant_request_id: Uuid) -> Result<Vec<Event>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("SqliteEventStore".to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT sequence, event_json FROM events WHERE request_id = ?1 ORDER BY sequence ASC",
        )?;
        let rows = stmt.query_map(params![assistant_request_id.to_string()], |row| {
            let sequence: i64 = row.get(0)?;
            let event_json: String = row.get(1)?;
            Ok((sequence, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (sequence, event_json) = row?;
            let mut event: Event = serde_json::from_str(&event_json)?;
            event.sequence = Some(sequence as u64);
            events.push(event);
        }
        Ok(events)
    }

    fn has_events_for_request(&self, assistant_request_id: Uuid) -> Result<bool, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("SqliteEventStore".to_string()))?;

        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM events WHERE request_id = ?1 LIMIT 1",
                params![assistant_request_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::{EventKind, InvokeContext, ParticipantKind, PublishRecord, Role};

    fn event_for(request_id: Uuid) -> Event {
        Event::new(
            Uuid::new_v4(),
            1,
            InvokeContext::new(request_id, Uuid::new_v4(), Uuid::new_v4()),
            EventKind::PublishToTopic(PublishRecord {
                topic_name: "In".to_string(),
                offset: 0,
                data: vec![chorus_types::Message::new(Uuid::new_v4(), 1, Role::User)],
                consumed_event_ids: vec![],
                publisher_name: "facade".to_string(),
                publisher_type: ParticipantKind::Facade,
            }),
        )
    }

    #[test]
    fn persists_and_orders_by_sequence() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let request_id = Uuid::new_v4();
        store.append(event_for(request_id)).unwrap();
        store.append(event_for(request_id)).unwrap();

        let events = store.events_for_request(request_id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, Some(1));
        assert_eq!(events[1].sequence, Some(2));
    }

    #[test]
    fn reports_presence_per_request() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let request_id = Uuid::new_v4();
        assert!(!store.has_events_for_request(request_id).unwrap());
        store.append(event_for(request_id)).unwrap();
        assert!(store.has_events_for_request(request_id).unwrap());
    }
}
