use std::collections::HashMap;
use std::sync::Arc;

use chorus_engine::{GraphError, Node, Topic, TopicKind};
use chorus_store::EventStore;

use crate::reserved::{AGENT_INPUT_TOPIC, AGENT_OUTPUT_TOPIC};
use crate::workflow::Workflow;

/// Accumulates nodes and topics, then validates and assembles a
/// [`Workflow`] (spec §4.5 "Build-time responsibilities"). Mirrors the
/// fluent builder pattern the subscription DSL itself uses.
pub struct WorkflowBuilder {
    name: String,
    workflow_type: String,
    nodes: Vec<Node>,
    topics: Vec<Topic>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>, workflow_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workflow_type: workflow_type.into(),
            nodes: Vec::new(),
            topics: Vec::new(),
        }
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topics.push(topic);
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Validates and constructs the [`Workflow`]. Every failure mode here
    /// is a [`GraphError`] — fatal at construction, never at runtime (spec
    /// §4.1 "Publishing to a non-existent topic... fails fatally at
    /// graph-validation time").
    pub fn build(self, store: Arc<dyn EventStore>) -> Result<Workflow, GraphError> {
        let mut topics: HashMap<String, Topic> = HashMap::new();
        for topic in self.topics {
            let name = topic.name().to_string();
            if topics.insert(name.clone(), topic).is_some() {
                return Err(GraphError::DuplicateTopicName(name));
            }
        }

        let mut nodes: HashMap<String, Node> = HashMap::new();
        for node in self.nodes {
            let name = node.name().to_string();
            if nodes.contains_key(&name) {
                return Err(GraphError::DuplicateNodeName(name));
            }
            nodes.insert(name, node);
        }

        for required in [AGENT_INPUT_TOPIC, AGENT_OUTPUT_TOPIC] {
            if !topics.contains_key(required) {
                return Err(GraphError::MissingReservedTopic(required.to_string()));
            }
        }

        let mut topic_to_subscribers: HashMap<String, Vec<String>> = HashMap::new();
        for node in nodes.values() {
            for topic_name in node.subscription().topics() {
                let Some(topic) = topics.get(topic_name) else {
                    return Err(GraphError::UnknownSubscribedTopic {
                        node: node.name().to_string(),
                        topic: topic_name.to_string(),
                    });
                };
                let _ = topic;
                topic_to_subscribers
                    .entry(topic_name.to_string())
                    .or_default()
                    .push(node.name().to_string());
            }

            for topic_name in node.publish_to() {
                let Some(topic) = topics.get(topic_name) else {
                    return Err(GraphError::UnknownPublishTopic {
                        node: node.name().to_string(),
                        topic: topic_name.clone(),
                    });
                };

                if topic.kind() == TopicKind::Output && !crate::reserved::is_reserved_output_topic(topic_name) {
                    return Err(GraphError::OutputTopicHasUnexpectedPublisher {
                        topic: topic_name.clone(),
                        node: node.name().to_string(),
                    });
                }
            }
        }

        propagate_function_specs(&mut nodes, &topic_to_subscribers);

        Ok(Workflow::new(
            self.name,
            self.workflow_type,
            nodes,
            topics,
            topic_to_subscribers,
            store,
        ))
    }
}

/// For every LLM-caller node that publishes into a topic a function-call
/// node subscribes to, attach that function-call node's `function_specs`
/// so downstream language models can discover available tools (spec §4.5
/// — "the one place where graph topology leaks into per-message
/// metadata; performed once at build time").
fn propagate_function_specs(
    nodes: &mut HashMap<String, Node>,
    topic_to_subscribers: &HashMap<String, Vec<String>>,
) {
    let function_call_specs: HashMap<String, Vec<chorus_engine::FunctionSpec>> = nodes
        .values()
        .filter(|n| n.node_type() == "function-call")
        .filter_map(|n| n.function_specs().map(|specs| (n.name().to_string(), specs.to_vec())))
        .collect();

    if function_call_specs.is_empty() {
        return;
    }

    let llm_caller_names: Vec<String> = nodes
        .values()
        .filter(|n| n.node_type() == "llm-caller")
        .map(|n| n.name().to_string())
        .collect();

    for caller_name in llm_caller_names {
        let mut discovered = Vec::new();
        if let Some(caller) = nodes.get(&caller_name) {
            for topic_name in caller.publish_to() {
                if let Some(subscribers) = topic_to_subscribers.get(topic_name) {
                    for subscriber in subscribers {
                        if let Some(specs) = function_call_specs.get(subscriber) {
                            discovered.extend(specs.clone());
                        }
                    }
                }
            }
        }
        if !discovered.is_empty() {
            if let Some(caller) = nodes.get_mut(&caller_name) {
                caller.set_function_specs(discovered);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_engine::{Command, CommandError, Expr};
    use chorus_store::InMemoryEventStore;
    use chorus_types::{ConsumeRecord, InvokeContext, Message};
    use std::collections::HashSet;

    struct Stub;
    impl Command for Stub {
        fn run(&self, _ctx: &InvokeContext, _input: &[ConsumeRecord]) -> Result<Vec<Message>, CommandError> {
            Ok(vec![])
        }
    }

    fn reserved_topics() -> Vec<Topic> {
        vec![
            Topic::new(AGENT_INPUT_TOPIC, TopicKind::Standard),
            Topic::new(AGENT_OUTPUT_TOPIC, TopicKind::Output),
        ]
    }

    #[test]
    fn rejects_unknown_subscribed_topic() {
        let node = Node::new(
            "L",
            "llm-caller",
            Expr::topic("missing"),
            HashSet::new(),
            Arc::new(Stub),
        );
        let err = WorkflowBuilder::new("wf", "test")
            .with_topic(Topic::new(AGENT_INPUT_TOPIC, TopicKind::Standard))
            .with_topic(Topic::new(AGENT_OUTPUT_TOPIC, TopicKind::Output))
            .with_node(node)
            .build(Arc::new(InMemoryEventStore::new()))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownSubscribedTopic { .. }));
    }

    #[test]
    fn rejects_missing_reserved_topics() {
        let err = WorkflowBuilder::new("wf", "test")
            .build(Arc::new(InMemoryEventStore::new()))
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingReservedTopic(_)));
    }

    #[test]
    fn builds_subscriber_index() {
        let node = Node::new(
            "L",
            "llm-caller",
            Expr::topic(AGENT_INPUT_TOPIC),
            HashSet::from([AGENT_OUTPUT_TOPIC.to_string()]),
            Arc::new(Stub),
        );
        let workflow = WorkflowBuilder::new("wf", "test")
            .with_topic(reserved_topics().remove(0))
            .with_topic(Topic::new(AGENT_OUTPUT_TOPIC, TopicKind::Output))
            .with_node(node)
            .build(Arc::new(InMemoryEventStore::new()))
            .unwrap();
        assert_eq!(
            workflow.topic_to_subscribers.get(AGENT_INPUT_TOPIC),
            Some(&vec!["L".to_string()])
        );
    }
}
