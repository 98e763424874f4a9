use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chorus_core::Clock;
use chorus_types::{
    ConsumeRecord, Event, EventKind, InvokeContext, Message, ParticipantKind, PublishRecord,
};
use uuid::Uuid;

use crate::error::ProtocolError;

/// What role a topic plays in the workflow — the variants of spec §4.1,
/// modeled as a field rather than a trait-object hierarchy (spec §9:
/// "Topic as an abstract type with variants rather than inheritance").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Standard,
    /// Restricted to the reserved output channel; the assistant façade is
    /// its only permitted consumer; may carry streaming/partial messages.
    Output,
    /// Publishes ask-the-user messages as Output events; accepts later
    /// user replies as standard Publish events via `append_user_input`.
    HumanRequest,
}

/// Pure predicate a topic applies to a publish payload before admitting it.
/// Rejected publishes leave no trace (spec T4).
pub type AdmissionPredicate = Arc<dyn Fn(&[Message]) -> bool + Send + Sync>;

fn always_admit() -> AdmissionPredicate {
    Arc::new(|_| true)
}

/// Offset-indexed FIFO log of publish events with per-consumer read offsets
/// and an admission predicate (spec §3, §4.1).
pub struct Topic {
    name: String,
    kind: TopicKind,
    admission: AdmissionPredicate,
    event_log: Vec<Event>,
    consumer_offsets: HashMap<String, u64>,
    delivered_outputs: HashSet<Uuid>,
}

impl Topic {
    pub fn new(name: impl Into<String>, kind: TopicKind) -> Self {
        Self {
            name: name.into(),
            kind,
            admission: always_admit(),
            event_log: Vec::new(),
            consumer_offsets: HashMap::new(),
            delivered_outputs: HashSet::new(),
        }
    }

    pub fn with_admission(mut self, predicate: AdmissionPredicate) -> Self {
        self.admission = predicate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.event_log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_log.is_empty()
    }

    pub fn event_log(&self) -> &[Event] {
        &self.event_log
    }

    /// `publish(invoke_context, publisher, messages, consumed_event_ids) →
    /// PublishEvent | nil` (spec §4.1). Evaluates the admission predicate;
    /// on acceptance assigns the next offset, appends, and returns the event.
    /// On rejection returns `None` and mutates no state.
    pub fn publish(
        &mut self,
        clock: &Clock,
        invoke_context: &InvokeContext,
        publisher_name: &str,
        publisher_type: ParticipantKind,
        messages: Vec<Message>,
        consumed_event_ids: Vec<Uuid>,
    ) -> Option<Event> {
        if !(self.admission)(&messages) {
            return None;
        }

        let record = PublishRecord {
            topic_name: self.name.clone(),
            offset: self.event_log.len() as u64,
            data: messages,
            consumed_event_ids,
            publisher_name: publisher_name.to_string(),
            publisher_type,
        };

        let kind = match self.kind {
            TopicKind::Standard => EventKind::PublishToTopic(record),
            TopicKind::Output | TopicKind::HumanRequest => EventKind::OutputTopic(record),
        };

        let event = Event::new(Uuid::new_v4(), clock.now(), invoke_context.clone(), kind);
        self.event_log.push(event.clone());
        Some(event)
    }

    /// Writes a plain `PublishToTopic` event linking `consumed_event_ids =
    /// [parent_publish_event.event_id]` — the later user reply to a
    /// delivered ask-the-user Output event (spec §4.1). Only valid on
    /// `HumanRequest` topics, and only once the parent has been delivered
    /// to the assistant (observed via a consumer draining it).
    pub fn append_user_input(
        &mut self,
        clock: &Clock,
        invoke_context: &InvokeContext,
        parent_event_id: Uuid,
        messages: Vec<Message>,
    ) -> Result<Option<Event>, ProtocolError> {
        if self.kind != TopicKind::HumanRequest {
            return Err(ProtocolError::NotHumanRequestTopic(self.name.clone()));
        }
        if !self.event_log.iter().any(|e| e.event_id == parent_event_id) {
            return Err(ProtocolError::UnknownParent(parent_event_id));
        }
        if !self.delivered_outputs.contains(&parent_event_id) {
            return Err(ProtocolError::ParentNotDelivered(parent_event_id));
        }

        if !(self.admission)(&messages) {
            return Ok(None);
        }

        let record = PublishRecord {
            topic_name: self.name.clone(),
            offset: self.event_log.len() as u64,
            data: messages,
            consumed_event_ids: vec![parent_event_id],
            publisher_name: "facade".to_string(),
            publisher_type: ParticipantKind::Facade,
        };
        let event = Event::new(
            Uuid::new_v4(),
            clock.now(),
            invoke_context.clone(),
            EventKind::PublishToTopic(record),
        );
        self.event_log.push(event.clone());
        Ok(Some(event))
    }

    /// `can_consume(consumer) → bool`: true iff the consumer has unread
    /// events (missing consumers default to offset 0).
    pub fn can_consume(&self, consumer: &str) -> bool {
        self.offset_for(consumer) < self.event_log.len() as u64
    }

    /// Whether this topic currently counts as "fresh" for readiness
    /// purposes (spec §4.2's `fresh` set, fed into `Expr::evaluate`).
    /// Standard and Output topics: any unread event counts. HumanRequest
    /// topics: only plain `PublishToTopic` entries count — a node
    /// subscribed to hear the user's reply must not fire merely because
    /// the ask-the-user `OutputTopic` event itself is unread (spec §8 S5,
    /// "subscription on human_request_topic is filtered to non-output
    /// publishes").
    pub fn has_fresh_subscriber_events(&self, consumer: &str) -> bool {
        let offset = self.offset_for(consumer) as usize;
        if offset >= self.event_log.len() {
            return false;
        }
        match self.kind {
            TopicKind::Standard | TopicKind::Output => true,
            TopicKind::HumanRequest => self.event_log[offset..]
                .iter()
                .any(|e| matches!(e.kind, EventKind::PublishToTopic(_))),
        }
    }

    /// `consume(consumer) → list of PublishEvent`: returns the unread slice
    /// and advances the consumer's offset to the log length. Any `Output`
    /// events in the slice are marked delivered, unblocking
    /// `append_user_input` for their replies.
    pub fn consume(&mut self, consumer: &str) -> Vec<Event> {
        let offset = self.offset_for(consumer) as usize;
        let slice = self.event_log[offset..].to_vec();
        self.consumer_offsets
            .insert(consumer.to_string(), self.event_log.len() as u64);

        for event in &slice {
            if matches!(event.kind, EventKind::OutputTopic(_)) {
                self.delivered_outputs.insert(event.event_id);
            }
        }

        slice
    }

    fn offset_for(&self, consumer: &str) -> u64 {
        self.consumer_offsets.get(consumer).copied().unwrap_or(0)
    }

    /// True for a `HumanRequest` topic whose most recent event is still an
    /// unanswered ask (spec §8 S5): a dispatch driver whose ready queue
    /// just drained should treat this as a pause, not request completion.
    pub fn is_awaiting_human_reply(&self) -> bool {
        self.kind == TopicKind::HumanRequest
            && matches!(self.event_log.last().map(|e| &e.kind), Some(EventKind::OutputTopic(_)))
    }

    pub fn reset(&mut self) {
        self.event_log.clear();
        self.consumer_offsets.clear();
        self.delivered_outputs.clear();
    }

    /// Restoration hook: appends publish events verbatim (preserving
    /// offsets) and advances consumer offsets from consume events, taking
    /// the maximum of current and `offset + 1` (spec §4.1).
    pub fn restore(&mut self, event: &Event) {
        match &event.kind {
            EventKind::PublishToTopic(_) | EventKind::OutputTopic(_) => {
                self.event_log.push(event.clone());
            }
            EventKind::ConsumeFromTopic(record) => {
                let entry = self
                    .consumer_offsets
                    .entry(record.consumer_name.clone())
                    .or_insert(0);
                *entry = (*entry).max(record.offset + 1);
            }
            _ => {}
        }
    }

    /// Builds the [`ConsumeRecord`] a workflow records alongside a consume
    /// — the shared shape logged both as the per-node `NodeInvoke.input_data`
    /// entry and as the standalone `ConsumeFromTopic` event.
    pub fn consume_record(
        &self,
        consumer_name: &str,
        consumer_type: ParticipantKind,
        events: &[Event],
    ) -> Vec<ConsumeRecord> {
        events
            .iter()
            .filter_map(|event| match &event.kind {
                EventKind::PublishToTopic(r) | EventKind::OutputTopic(r) => Some(ConsumeRecord {
                    topic_name: r.topic_name.clone(),
                    offset: r.offset,
                    data: r.data.clone(),
                    consumer_name: consumer_name.to_string(),
                    consumer_type,
                }),
                _ => None,
            })
            .collect()
    }
}
