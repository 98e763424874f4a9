//! Integration tests for `SqliteEventStore` durability across process restarts.

use chorus_store::{EventStore, SqliteEventStore};
use chorus_types::{Event, EventKind, InvokeContext, Message, ParticipantKind, PublishRecord, Role};
use tempfile::TempDir;
use uuid::Uuid;

fn publish_event(request_id: Uuid) -> Event {
    Event::new(
        Uuid::new_v4(),
        1,
        InvokeContext::new(request_id, Uuid::new_v4(), Uuid::new_v4()),
        EventKind::PublishToTopic(PublishRecord {
            topic_name: "agent_input_topic".to_string(),
            offset: 0,
            data: vec![Message::new(Uuid::new_v4(), 1, Role::User)],
            consumed_event_ids: vec![],
            publisher_name: "facade".to_string(),
            publisher_type: ParticipantKind::Facade,
        }),
    )
}

#[test]
fn events_survive_reopening_the_same_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("events.db");
    let request_id = Uuid::new_v4();

    {
        let store = SqliteEventStore::open(&db_path).unwrap();
        store.append(publish_event(request_id)).unwrap();
        store.append(publish_event(request_id)).unwrap();
    }

    let store = SqliteEventStore::open(&db_path).unwrap();
    let events = store.events_for_request(request_id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, Some(1));
    assert_eq!(events[1].sequence, Some(2));
}

#[test]
fn reopening_does_not_clear_other_requests() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("events.db");
    let first_request = Uuid::new_v4();
    let second_request = Uuid::new_v4();

    {
        let store = SqliteEventStore::open(&db_path).unwrap();
        store.append(publish_event(first_request)).unwrap();
    }
    {
        let store = SqliteEventStore::open(&db_path).unwrap();
        store.append(publish_event(second_request)).unwrap();
    }

    let store = SqliteEventStore::open(&db_path).unwrap();
    assert!(store.has_events_for_request(first_request).unwrap());
    assert!(store.has_events_for_request(second_request).unwrap());
    assert_eq!(store.events_for_request(first_request).unwrap().len(), 1);
    assert_eq!(store.events_for_request(second_request).unwrap().len(), 1);
}
