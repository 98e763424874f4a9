use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chorus_core::Clock;
use chorus_engine::{CommandError, Node, Topic};
use chorus_store::EventStore;
use chorus_types::{
    ConsumeRecord, Event, EventKind, InvokeContext, Message, NodeIdentity, ParticipantKind,
    WorkflowIdentity,
};
use uuid::Uuid;

use crate::error::Result;
use crate::reserved::is_reserved_output_topic;

/// Everything needed to run a node's command, handed back by
/// [`Workflow::begin_dispatch`] so the caller can execute it outside any
/// lock the driver might be holding.
pub struct DispatchTicket {
    pub node_name: String,
    pub command: Arc<dyn chorus_engine::Command>,
    pub input: Vec<ConsumeRecord>,
    /// `event_id`s of the original publish events drained to build `input`
    /// — the causal parents recorded on whatever this node goes on to
    /// publish (spec §4.3, S1).
    pub consumed_event_ids: Vec<Uuid>,
}

/// Owns the topic map, the node map, the subscriber index, and the ready
/// queue for one workflow graph (spec §3, §4.5). A single `Workflow`
/// instance is reused across many requests; all per-request state lives in
/// topics and the injected event store.
pub struct Workflow {
    pub(crate) name: String,
    pub(crate) workflow_type: String,
    pub(crate) nodes: HashMap<String, Node>,
    pub(crate) topics: HashMap<String, Topic>,
    pub(crate) topic_to_subscribers: HashMap<String, Vec<String>>,
    ready_queue: VecDeque<String>,
    queued: HashSet<String>,
    /// Nodes re-enqueued by [`Workflow::restore`] whose `NodeInvoke` has no
    /// matching outcome — their already-recorded input and causal parents,
    /// so [`Workflow::begin_dispatch`] resumes the same invocation instead
    /// of re-consuming topics that were already drained before the crash.
    pending_replays: HashMap<String, (Vec<ConsumeRecord>, Vec<Uuid>)>,
    /// Most recent messages published to a reserved output topic, held so
    /// the dispatch driver can attach them to `WorkflowRespond` once the
    /// ready queue drains (spec §8 S1).
    last_output: Vec<Message>,
    clock: Clock,
    store: Arc<dyn EventStore>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("workflow_type", &self.workflow_type)
            .finish_non_exhaustive()
    }
}

impl Workflow {
    pub(crate) fn new(
        name: String,
        workflow_type: String,
        nodes: HashMap<String, Node>,
        topics: HashMap<String, Topic>,
        topic_to_subscribers: HashMap<String, Vec<String>>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            name,
            workflow_type,
            nodes,
            topics,
            topic_to_subscribers,
            ready_queue: VecDeque::new(),
            queued: HashSet::new(),
            pending_replays: HashMap::new(),
            last_output: Vec::new(),
            clock: Clock::new(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_queue_empty(&self) -> bool {
        self.ready_queue.is_empty()
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    /// Drains a reserved topic for the façade, recording a
    /// `ConsumeFromTopic` event (spec §6: the façade is a plain consumer
    /// of `agent_output_topic`/`human_request_topic`, same mechanics as
    /// any node).
    pub fn consume_as_facade(&mut self, topic_name: &str, consumer_name: &str) -> Vec<Event> {
        let Some(topic) = self.topics.get_mut(topic_name) else {
            return Vec::new();
        };
        if !topic.can_consume(consumer_name) {
            return Vec::new();
        }
        let drained = topic.consume(consumer_name);
        for event in &drained {
            let _ = self.store.append(Event::new(
                Uuid::new_v4(),
                self.clock.now(),
                event.invoke_context.clone(),
                EventKind::ConsumeFromTopic(ConsumeRecord {
                    topic_name: topic_name.to_string(),
                    offset: match &event.kind {
                        EventKind::OutputTopic(r) | EventKind::PublishToTopic(r) => r.offset,
                        _ => 0,
                    },
                    data: match &event.kind {
                        EventKind::OutputTopic(r) | EventKind::PublishToTopic(r) => r.data.clone(),
                        _ => Vec::new(),
                    },
                    consumer_name: consumer_name.to_string(),
                    consumer_type: ParticipantKind::Facade,
                }),
            ));
        }
        drained
    }

    fn enqueue(&mut self, node_name: &str) {
        if self.queued.insert(node_name.to_string()) {
            self.ready_queue.push_back(node_name.to_string());
        }
    }

    fn node_identity(&self, node: &Node) -> NodeIdentity {
        NodeIdentity {
            node_id: node.node_id(),
            node_name: node.name().to_string(),
            node_type: node.node_type().to_string(),
            subscribed_topics: node.subscription().topics().into_iter().map(String::from).collect(),
            publish_to_topics: node.publish_to().iter().cloned().collect(),
        }
    }

    fn append(&self, event: Event) -> Result<()> {
        self.store.append(event)?;
        Ok(())
    }

    /// `initialize(invoke_context, input_messages)` (spec §4.5): either
    /// starts a fresh request by publishing to the reserved input topic, or
    /// restores in-memory state from the event store and re-enqueues any
    /// node whose `NodeInvoke` has no matching `NodeRespond`/`NodeFailed`.
    pub fn initialize(
        &mut self,
        invoke_context: &InvokeContext,
        input_messages: Vec<Message>,
    ) -> Result<()> {
        if self
            .store
            .has_events_for_request(invoke_context.assistant_request_id)?
        {
            self.restore(invoke_context.assistant_request_id)?;
            return Ok(());
        }

        self.append(Event::new(
            Uuid::new_v4(),
            self.clock.now(),
            invoke_context.clone(),
            EventKind::WorkflowInvoke {
                identity: WorkflowIdentity {
                    workflow_name: self.name.clone(),
                    workflow_type: self.workflow_type.clone(),
                },
                input_data: input_messages.clone(),
            },
        ))?;

        self.publish_and_record(
            invoke_context,
            crate::reserved::AGENT_INPUT_TOPIC,
            "facade",
            ParticipantKind::Facade,
            input_messages,
            vec![],
        )?;

        Ok(())
    }

    /// Publishes `messages` to `topic_name` on behalf of an external
    /// participant (the façade seeding a topic other than the reserved
    /// input, or a test driver) and re-checks subscriber readiness — the
    /// same path [`Workflow::initialize`] uses for the reserved input
    /// topic, exposed for workflows with more than one externally-fed
    /// topic (spec §4.1: publishing is not restricted to nodes).
    pub fn publish(
        &mut self,
        invoke_context: &InvokeContext,
        topic_name: &str,
        publisher_name: &str,
        messages: Vec<Message>,
    ) -> Result<Option<Event>> {
        self.publish_and_record(
            invoke_context,
            topic_name,
            publisher_name,
            ParticipantKind::Facade,
            messages,
            vec![],
        )
    }

    /// Replays the stored history to rebuild in-memory topic state, then
    /// re-enqueues any node whose `NodeInvoke` has no matching
    /// `NodeRespond`/`NodeFailed` (spec §8 S6, invariant P6). The node
    /// resumes with the exact input it was invoked with before the crash —
    /// recovered from that `NodeInvoke`'s `input_data` — rather than
    /// re-consuming topics a second time, since `Topic::restore` has
    /// already advanced consumer offsets past what was drained.
    fn restore(&mut self, assistant_request_id: Uuid) -> Result<()> {
        let events = self.store.events_for_request(assistant_request_id)?;
        let mut in_flight: HashMap<String, Vec<ConsumeRecord>> = HashMap::new();

        for event in &events {
            if let Some(topic_name) = event.kind.topic_name() {
                if let Some(topic) = self.topics.get_mut(topic_name) {
                    topic.restore(event);
                }
            }

            match &event.kind {
                EventKind::NodeInvoke { identity, input_data } => {
                    in_flight.insert(identity.node_name.clone(), input_data.clone());
                }
                EventKind::NodeRespond { identity, .. } | EventKind::NodeFailed { identity, .. } => {
                    in_flight.remove(&identity.node_name);
                }
                _ => {}
            }
        }

        let mut catalog = chorus_engine::PublishCatalog::new();
        catalog.index(&events);

        for (node_name, input_data) in in_flight {
            let consumed_event_ids = input_data
                .iter()
                .filter_map(|record| catalog.lookup(&record.topic_name, record.offset))
                .collect();
            self.pending_replays
                .insert(node_name.clone(), (input_data, consumed_event_ids));
            self.enqueue(&node_name);
        }

        Ok(())
    }

    /// Publishes `messages` to `topic_name`, records the event, and runs
    /// `on_event`: every subscriber of `topic_name` is re-checked for
    /// readiness (spec §4.5), except the reserved output topics, which only
    /// the assistant façade consumes.
    fn publish_and_record(
        &mut self,
        invoke_context: &InvokeContext,
        topic_name: &str,
        publisher_name: &str,
        publisher_type: ParticipantKind,
        messages: Vec<Message>,
        consumed_event_ids: Vec<Uuid>,
    ) -> Result<Option<Event>> {
        if is_reserved_output_topic(topic_name) {
            self.last_output = messages.clone();
        }

        let clock = &self.clock;
        let event = match self.topics.get_mut(topic_name) {
            Some(topic) => topic.publish(
                clock,
                invoke_context,
                publisher_name,
                publisher_type,
                messages,
                consumed_event_ids,
            ),
            None => None,
        };

        let Some(event) = event else {
            return Ok(None);
        };

        self.append(event.clone())?;

        if !is_reserved_output_topic(topic_name) {
            self.on_event(topic_name);
        }

        Ok(Some(event))
    }

    fn on_event(&mut self, topic_name: &str) {
        let subscribers = self
            .topic_to_subscribers
            .get(topic_name)
            .cloned()
            .unwrap_or_default();

        for node_name in subscribers {
            let ready = self
                .nodes
                .get(&node_name)
                .map(|node| node.ready(&self.topics))
                .unwrap_or(false);
            if ready {
                self.enqueue(&node_name);
            }
        }
    }

    /// Pops the next ready node name, re-checks readiness (topic state may
    /// have shifted since it was enqueued), consumes its input, and records
    /// `NodeInvoke`. Returns `None` if the queue is empty or the popped
    /// node is no longer ready.
    pub fn begin_dispatch(&mut self, invoke_context: &InvokeContext) -> Result<Option<DispatchTicket>> {
        let Some(node_name) = self.ready_queue.pop_front() else {
            return Ok(None);
        };
        self.queued.remove(&node_name);

        let Some(node) = self.nodes.get(&node_name) else {
            return Ok(None);
        };

        if let Some((input, consumed_event_ids)) = self.pending_replays.remove(&node_name) {
            return Ok(Some(DispatchTicket {
                node_name,
                command: node.command().clone(),
                input,
                consumed_event_ids,
            }));
        }

        if !node.ready(&self.topics) {
            return Ok(None);
        }

        let referenced: Vec<String> = node.subscription().topics().into_iter().map(String::from).collect();
        let command = node.command().clone();
        let identity = self.node_identity(node);

        let mut input = Vec::new();
        let mut consumed_event_ids = Vec::new();
        let mut records_by_topic = Vec::new();
        for topic_name in &referenced {
            let Some(topic) = self.topics.get_mut(topic_name) else {
                continue;
            };
            if !topic.has_fresh_subscriber_events(&node_name) {
                continue;
            }
            let drained = topic.consume(&node_name);
            consumed_event_ids.extend(drained.iter().map(|e| e.event_id));
            let records = topic.consume_record(&node_name, ParticipantKind::Node, &drained);
            input.extend(records.clone());
            records_by_topic.push(records);
        }

        // NodeInvoke precedes ConsumeFromTopic in the recorded history
        // (spec §8 S1): the node's invocation is logically what triggers
        // the consume, even though the topic offsets already advanced.
        self.append(Event::new(
            Uuid::new_v4(),
            self.clock.now(),
            invoke_context.clone(),
            EventKind::NodeInvoke {
                identity,
                input_data: input.clone(),
            },
        ))?;

        for records in records_by_topic {
            for record in &records {
                self.append(Event::new(
                    Uuid::new_v4(),
                    self.clock.now(),
                    invoke_context.clone(),
                    EventKind::ConsumeFromTopic(record.clone()),
                ))?;
            }
        }

        Ok(Some(DispatchTicket {
            node_name,
            command,
            input,
            consumed_event_ids,
        }))
    }

    /// Records the outcome of a [`DispatchTicket`]'s command execution:
    /// `NodeRespond` plus a `PublishToTopic`/`OutputTopic` event per
    /// `publish_to` topic on success (each causally linked to the consumed
    /// events), or `NodeFailed` on error, then re-evaluates readiness for
    /// every topic that changed.
    pub fn complete_dispatch(
        &mut self,
        invoke_context: &InvokeContext,
        ticket: DispatchTicket,
        outcome: std::result::Result<Vec<Message>, CommandError>,
    ) -> Result<()> {
        let Some(node) = self.nodes.get(&ticket.node_name) else {
            return Ok(());
        };
        let identity = self.node_identity(node);
        let publish_to: Vec<String> = node.publish_to().iter().cloned().collect();

        match outcome {
            Ok(output) => {
                self.append(Event::new(
                    Uuid::new_v4(),
                    self.clock.now(),
                    invoke_context.clone(),
                    EventKind::NodeRespond {
                        identity,
                        output_data: output.clone(),
                    },
                ))?;

                let consumed_event_ids = ticket.consumed_event_ids.clone();
                for topic_name in &publish_to {
                    self.publish_and_record(
                        invoke_context,
                        topic_name,
                        &ticket.node_name,
                        ParticipantKind::Node,
                        output.clone(),
                        consumed_event_ids.clone(),
                    )?;
                }
            }
            Err(err) => {
                self.append(Event::new(
                    Uuid::new_v4(),
                    self.clock.now(),
                    invoke_context.clone(),
                    EventKind::NodeFailed {
                        identity,
                        error: err.to_string(),
                    },
                ))?;
            }
        }

        Ok(())
    }

    /// Writes a standard publish linking `consumed_event_ids =
    /// [parent_event_id]` to a `HumanRequestTopic` (spec §4.1), re-running
    /// readiness for any downstream subscriber. Used by
    /// [`crate::Facade::resume`].
    pub fn append_user_input(
        &mut self,
        invoke_context: &InvokeContext,
        topic_name: &str,
        parent_event_id: Uuid,
        messages: Vec<Message>,
    ) -> Result<Option<Event>> {
        let event = {
            let topic = self
                .topics
                .get_mut(topic_name)
                .ok_or_else(|| crate::error::Error::InvalidOperation(format!("unknown topic {topic_name}")))?;
            topic.append_user_input(&self.clock, invoke_context, parent_event_id, messages)?
        };

        let Some(event) = event else {
            return Ok(None);
        };

        self.append(event.clone())?;
        self.on_event(topic_name);
        Ok(Some(event))
    }

    /// Records `WorkflowRespond` once the ready queue has drained, unless a
    /// `HumanRequest` topic is sitting on an unanswered ask — that drain is
    /// a pause (spec §8 S5), not completion, so no terminal event is
    /// recorded and the request stays open for [`crate::Facade::resume`].
    pub fn finish_request(&mut self, invoke_context: &InvokeContext) -> Result<()> {
        if self.topics.values().any(Topic::is_awaiting_human_reply) {
            return Ok(());
        }

        let output = std::mem::take(&mut self.last_output);
        self.append(Event::new(
            Uuid::new_v4(),
            self.clock.now(),
            invoke_context.clone(),
            EventKind::WorkflowRespond {
                identity: WorkflowIdentity {
                    workflow_name: self.name.clone(),
                    workflow_type: self.workflow_type.clone(),
                },
                output_data: output,
            },
        ))
    }

    /// Records `WorkflowFailed` for a fatal/protocol error or a cancelled
    /// request (spec §5, §7): the current request cannot make further
    /// progress.
    pub fn fail_request(&mut self, invoke_context: &InvokeContext, error: String) -> Result<()> {
        self.last_output.clear();
        self.append(Event::new(
            Uuid::new_v4(),
            self.clock.now(),
            invoke_context.clone(),
            EventKind::WorkflowFailed {
                identity: WorkflowIdentity {
                    workflow_name: self.name.clone(),
                    workflow_type: self.workflow_type.clone(),
                },
                error,
            },
        ))
    }
}
