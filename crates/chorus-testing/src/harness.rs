use std::sync::Arc;

use chorus_engine::{GraphError, Node, Topic};
use chorus_runtime::{Workflow, WorkflowBuilder};
use chorus_store::InMemoryEventStore;

/// Fluent harness around [`WorkflowBuilder`] that always seeds the two
/// required reserved topics, so scenario tests only have to describe the
/// topics and nodes specific to them — mirrors `agtrace_testing::TestWorld`
/// supplying the common environment so each test only states what's
/// different about it.
pub struct TestWorkflowBuilder {
    builder: WorkflowBuilder,
}

impl TestWorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            builder: WorkflowBuilder::new(name, "test")
                .with_topic(Topic::new(
                    chorus_runtime::reserved::AGENT_INPUT_TOPIC,
                    chorus_engine::TopicKind::Standard,
                ))
                .with_topic(Topic::new(
                    chorus_runtime::reserved::AGENT_OUTPUT_TOPIC,
                    chorus_engine::TopicKind::Output,
                )),
        }
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.builder = self.builder.with_topic(topic);
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.builder = self.builder.with_node(node);
        self
    }

    pub fn build(self) -> Result<TestWorkflow, GraphError> {
        let store = Arc::new(InMemoryEventStore::new());
        let workflow = self.builder.build(store.clone())?;
        Ok(TestWorkflow { workflow, store })
    }
}

/// A built workflow plus the concrete in-memory store backing it, so a
/// test can both drive the workflow and inspect `events_for_request`
/// directly for assertions.
pub struct TestWorkflow {
    pub workflow: Workflow,
    pub store: Arc<InMemoryEventStore>,
}
