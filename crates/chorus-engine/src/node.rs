use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chorus_core::new_id;
use uuid::Uuid;

use crate::command::{Command, FunctionSpec};
use crate::subscription::Expr;
use crate::topic::Topic;

/// A named participant in the workflow graph: a subscription expression
/// over input topics, a set of topics it is allowed to publish to, and the
/// opaque [`Command`] that does the actual work (spec §4.4).
///
/// `node_type` is a free-form tag ("llm-caller", "function-call",
/// "retrieval", ...) used only for event metadata and build-time
/// function-spec propagation — the engine never branches on it.
pub struct Node {
    node_id: Uuid,
    name: String,
    node_type: String,
    subscription: Expr,
    publish_to: HashSet<String>,
    command: Arc<dyn Command>,
    function_specs: Option<Vec<FunctionSpec>>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
        subscription: Expr,
        publish_to: HashSet<String>,
        command: Arc<dyn Command>,
    ) -> Self {
        Self {
            node_id: new_id(),
            name: name.into(),
            node_type: node_type.into(),
            subscription,
            publish_to,
            command,
            function_specs: None,
        }
    }

    pub fn with_function_specs(mut self, specs: Vec<FunctionSpec>) -> Self {
        self.function_specs = Some(specs);
        self
    }

    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn subscription(&self) -> &Expr {
        &self.subscription
    }

    pub fn publish_to(&self) -> &HashSet<String> {
        &self.publish_to
    }

    pub fn command(&self) -> &Arc<dyn Command> {
        &self.command
    }

    pub fn function_specs(&self) -> Option<&[FunctionSpec]> {
        self.function_specs.as_deref()
    }

    pub fn set_function_specs(&mut self, specs: Vec<FunctionSpec>) {
        self.function_specs = Some(specs);
    }

    /// `ready(node, topics) -> bool` (spec §4.2): evaluate the node's
    /// subscription expression against the set of topics it references
    /// that currently have unread events for this node.
    pub fn ready(&self, topics: &HashMap<String, Topic>) -> bool {
        let fresh: HashSet<&str> = self
            .subscription
            .topics()
            .into_iter()
            .filter(|name| {
                topics
                    .get(*name)
                    .map(|topic| topic.has_fresh_subscriber_events(&self.name))
                    .unwrap_or(false)
            })
            .collect();
        self.subscription.evaluate(&fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandError;
    use crate::topic::TopicKind;
    use chorus_core::Clock;
    use chorus_types::{ConsumeRecord, InvokeContext, Message, ParticipantKind, Role};
    use uuid::Uuid;

    struct Echo;
    impl Command for Echo {
        fn run(
            &self,
            _ctx: &InvokeContext,
            _input: &[ConsumeRecord],
        ) -> Result<Vec<Message>, CommandError> {
            Ok(vec![])
        }
    }

    #[test]
    fn ready_respects_and_semantics() {
        let clock = Clock::new();
        let ctx = InvokeContext::new(Uuid::nil(), Uuid::nil(), Uuid::nil());
        let mut topics = HashMap::new();
        topics.insert("A".to_string(), Topic::new("A", TopicKind::Standard));
        topics.insert("B".to_string(), Topic::new("B", TopicKind::Standard));

        let node = Node::new(
            "Merge",
            "llm-caller",
            Expr::topic("A").and(Expr::topic("B")),
            HashSet::new(),
            Arc::new(Echo),
        );

        assert!(!node.ready(&topics));

        let msg = Message::new(Uuid::new_v4(), clock.now(), Role::User);
        topics
            .get_mut("A")
            .unwrap()
            .publish(&clock, &ctx, "facade", ParticipantKind::Facade, vec![msg], vec![]);
        assert!(!node.ready(&topics));

        let msg = Message::new(Uuid::new_v4(), clock.now(), Role::User);
        topics
            .get_mut("B")
            .unwrap()
            .publish(&clock, &ctx, "facade", ParticipantKind::Facade, vec![msg], vec![]);
        assert!(node.ready(&topics));
    }
}
