use std::collections::{HashMap, HashSet};

use chorus_types::{ConsumeRecord, Event, EventKind, Message};
use uuid::Uuid;

use crate::error::DanglingParentError;

/// An index over every publish event currently known to the workflow,
/// built fresh for each ancestor-graph reconstruction. Lets
/// `ancestor_messages` resolve a consume seed to the publish it drained,
/// and a `consumed_event_ids` entry to its parent publish.
pub struct PublishCatalog<'a> {
    by_id: HashMap<Uuid, &'a Event>,
    by_topic_offset: HashMap<(&'a str, u64), Uuid>,
}

impl<'a> PublishCatalog<'a> {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_topic_offset: HashMap::new(),
        }
    }

    pub fn index(&mut self, events: &'a [Event]) {
        for event in events {
            if let EventKind::PublishToTopic(r) | EventKind::OutputTopic(r) = &event.kind {
                self.by_id.insert(event.event_id, event);
                self.by_topic_offset
                    .insert((r.topic_name.as_str(), r.offset), event.event_id);
            }
        }
    }

    /// Resolves a `(topic_name, offset)` pair to the `event_id` of the
    /// publish it names, used by restore to recover the causal parent of a
    /// consume recorded before a crash.
    pub fn lookup(&self, topic_name: &str, offset: u64) -> Option<Uuid> {
        self.by_topic_offset.get(&(topic_name, offset)).copied()
    }
}

impl<'a> Default for PublishCatalog<'a> {
    fn default() -> Self {
        Self::new()
    }
}

fn publish_record(event: &Event) -> Option<&chorus_types::PublishRecord> {
    match &event.kind {
        EventKind::PublishToTopic(r) | EventKind::OutputTopic(r) => Some(r),
        _ => None,
    }
}

/// Reconstructs the causally-then-chronologically ordered sequence of
/// ancestor messages for a set of seed `ConsumeFromTopic` records (spec
/// §4.3): the "conversation so far as seen from here."
///
/// Implementation follows the spec's hint literally: compute layers by
/// reverse-BFS from the roots (the publishes the seeds drained), sort each
/// layer by descending timestamp during assembly, concatenate the layers,
/// then reverse — yielding ascending timestamp overall while respecting
/// the partial order. A dangling `consumed_event_ids` reference is a fatal
/// data-integrity error, never silently skipped.
pub fn ancestor_messages(
    seeds: &[ConsumeRecord],
    catalog: &PublishCatalog,
) -> Result<Vec<Message>, DanglingParentError> {
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut roots: Vec<&Event> = Vec::new();

    for seed in seeds {
        if let Some(&id) = catalog
            .by_topic_offset
            .get(&(seed.topic_name.as_str(), seed.offset))
        {
            if visited.insert(id) {
                if let Some(event) = catalog.by_id.get(&id) {
                    roots.push(event);
                }
            }
        }
    }

    let mut layers: Vec<Vec<&Event>> = Vec::new();
    let mut current_layer = roots;

    while !current_layer.is_empty() {
        current_layer.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut next_layer = Vec::new();
        for event in &current_layer {
            let record = match publish_record(event) {
                Some(r) => r,
                None => continue,
            };
            for parent_id in &record.consumed_event_ids {
                if visited.contains(parent_id) {
                    continue;
                }
                let parent = catalog
                    .by_id
                    .get(parent_id)
                    .ok_or(DanglingParentError(*parent_id))?;
                visited.insert(*parent_id);
                next_layer.push(*parent);
            }
        }

        layers.push(current_layer);
        current_layer = next_layer;
    }

    let mut ordered: Vec<&Event> = layers.into_iter().flatten().collect();
    ordered.reverse();

    Ok(ordered
        .into_iter()
        .filter_map(publish_record)
        .flat_map(|r| r.data.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::{InvokeContext, ParticipantKind, PublishRecord, Role};

    fn ctx() -> InvokeContext {
        InvokeContext::new(Uuid::nil(), Uuid::nil(), Uuid::nil())
    }

    fn publish(
        topic: &str,
        offset: u64,
        timestamp: i64,
        text: &str,
        parents: Vec<Uuid>,
    ) -> Event {
        Event::new(
            Uuid::new_v4(),
            timestamp,
            ctx(),
            EventKind::PublishToTopic(PublishRecord {
                topic_name: topic.to_string(),
                offset,
                data: vec![Message::new(Uuid::new_v4(), timestamp, Role::User)
                    .with_content(chorus_types::Content::text(text))],
                consumed_event_ids: parents,
                publisher_name: "n".to_string(),
                publisher_type: ParticipantKind::Node,
            }),
        )
    }

    fn seed_for(topic: &str, offset: u64) -> ConsumeRecord {
        ConsumeRecord {
            topic_name: topic.to_string(),
            offset,
            data: vec![],
            consumer_name: "L".to_string(),
            consumer_type: ParticipantKind::Node,
        }
    }

    #[test]
    fn linear_chain_is_chronological() {
        let p0 = publish("A", 0, 1, "first", vec![]);
        let p1 = publish("A", 1, 2, "second", vec![p0.event_id]);
        let events = vec![p0, p1];
        let mut catalog = PublishCatalog::new();
        catalog.index(&events);

        let messages = ancestor_messages(&[seed_for("A", 1)], &catalog).unwrap();
        let texts: Vec<String> = messages.iter().map(|m| m.content.as_ref().unwrap().as_text()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn diamond_from_or_subscription_dedupes() {
        let root = publish("Shared", 0, 1, "root", vec![]);
        let left = publish("A", 0, 2, "left", vec![root.event_id]);
        let right = publish("B", 0, 3, "right", vec![root.event_id]);
        let events = vec![root, left, right];
        let mut catalog = PublishCatalog::new();
        catalog.index(&events);

        let messages =
            ancestor_messages(&[seed_for("A", 0), seed_for("B", 0)], &catalog).unwrap();
        let texts: Vec<String> = messages.iter().map(|m| m.content.as_ref().unwrap().as_text()).collect();
        assert_eq!(texts, vec!["root", "left", "right"]);
    }

    #[test]
    fn dangling_parent_is_fatal() {
        let dangling_parent = Uuid::new_v4();
        let orphan = publish("A", 0, 1, "orphan", vec![dangling_parent]);
        let events = vec![orphan];
        let mut catalog = PublishCatalog::new();
        catalog.index(&events);

        let err = ancestor_messages(&[seed_for("A", 0)], &catalog).unwrap_err();
        assert_eq!(err.0, dangling_parent);
    }
}
