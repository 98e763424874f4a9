use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chorus_engine::{Command, CommandError, Expr, Node};
use chorus_runtime::cancellation::CancellationToken;
use chorus_runtime::dispatch::parallel;
use chorus_runtime::reserved::AGENT_INPUT_TOPIC;
use chorus_store::EventStore;
use chorus_testing::assertions::assert_no_overlapping_node_invocations;
use chorus_testing::fixtures::{sample_invoke_context, user_message};
use chorus_testing::TestWorkflowBuilder;
use chorus_types::{ConsumeRecord, InvokeContext, Message};

/// Sleeps for a fixed duration, recording its own (start, end) window in a
/// shared log — lets the test prove two independent nodes' commands
/// actually overlapped in wall-clock time under the parallel driver,
/// rather than merely not crashing.
struct SlowEcho {
    delay: Duration,
    log: Arc<Mutex<Vec<(String, Instant, Instant)>>>,
    name: String,
}

impl Command for SlowEcho {
    fn run(&self, _ctx: &InvokeContext, _input: &[ConsumeRecord]) -> Result<Vec<Message>, CommandError> {
        let start = Instant::now();
        std::thread::sleep(self.delay);
        let end = Instant::now();
        self.log.lock().unwrap().push((self.name.clone(), start, end));
        Ok(vec![])
    }
}

/// (P5) Two independent nodes dispatched under the parallel driver run
/// concurrently — their execution windows overlap — while the recorded
/// event history still shows no two `NodeInvoke`s for the *same* node
/// running without an intervening outcome.
#[test]
fn independent_nodes_run_concurrently_under_parallel_dispatch() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let node_a = Node::new(
        "SlowA",
        "llm-caller",
        Expr::topic(AGENT_INPUT_TOPIC),
        HashSet::new(),
        Arc::new(SlowEcho {
            delay: Duration::from_millis(80),
            log: log.clone(),
            name: "SlowA".to_string(),
        }),
    );
    let node_b = Node::new(
        "SlowB",
        "llm-caller",
        Expr::topic(AGENT_INPUT_TOPIC),
        HashSet::new(),
        Arc::new(SlowEcho {
            delay: Duration::from_millis(80),
            log: log.clone(),
            name: "SlowB".to_string(),
        }),
    );

    let built = TestWorkflowBuilder::new("parallel-p5")
        .with_node(node_a)
        .with_node(node_b)
        .build()
        .unwrap();
    let ctx = sample_invoke_context();

    let workflow = Arc::new(Mutex::new(built.workflow));
    workflow.lock().unwrap().initialize(&ctx, vec![user_message("hello")]).unwrap();

    parallel::drive(workflow.clone(), &ctx, 2, CancellationToken::new(), Duration::from_millis(10)).unwrap();

    let windows = log.lock().unwrap();
    assert_eq!(windows.len(), 2);
    let (_, a_start, a_end) = &windows[0];
    let (_, b_start, b_end) = &windows[1];
    let overlap = a_start.max(b_start) < a_end.min(b_end);
    assert!(overlap, "expected the two nodes' executions to overlap in wall-clock time");

    let events = built.store.events_for_request(ctx.assistant_request_id).unwrap();
    assert_no_overlapping_node_invocations(&events).unwrap();
}
