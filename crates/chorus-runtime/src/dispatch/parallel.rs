use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chorus_types::InvokeContext;

use crate::cancellation::CancellationToken;
use crate::error::Result;
use crate::workflow::Workflow;

/// Runs the ready queue across a small fixed pool of `std::thread` workers
/// (spec §5.2). Engine-state mutation — popping the queue, recording
/// `NodeInvoke`/`NodeRespond`, publishing — happens under `workflow`'s
/// lock; the command itself runs outside the lock so commands genuinely
/// overlap. `in_flight` enforces that no two workers run the same node
/// name concurrently (P5), the same role `agtrace_runtime::runtime`'s
/// `Mutex<HashSet<String>>` plays for session dedup. `cancel` is polled by
/// every worker at `check_interval` while idling, and at the top of each
/// loop iteration, so a cancelled request stops picking up new tickets
/// promptly (spec §5).
pub fn drive(
    workflow: Arc<Mutex<Workflow>>,
    invoke_context: &InvokeContext,
    worker_count: usize,
    cancel: CancellationToken,
    check_interval: Duration,
) -> Result<()> {
    let in_flight = Arc::new(Mutex::new(HashSet::<String>::new()));
    let error: Arc<Mutex<Option<crate::error::Error>>> = Arc::new(Mutex::new(None));

    std::thread::scope(|scope| {
        for worker_index in 0..worker_count.max(1) {
            let workflow = Arc::clone(&workflow);
            let in_flight = Arc::clone(&in_flight);
            let error = Arc::clone(&error);
            let cancel = cancel.clone();
            let invoke_context = invoke_context.clone();

            std::thread::Builder::new()
                .name(format!("chorus-worker-{worker_index}"))
                .spawn_scoped(scope, move || {
                    worker_loop(&workflow, &invoke_context, &in_flight, &error, &cancel, check_interval);
                })
                .expect("failed to spawn chorus worker thread");
        }
    });

    if cancel.is_cancelled() {
        let mut guard = workflow.lock().unwrap();
        guard.fail_request(invoke_context, "request cancelled".to_string())?;
        return Err(crate::error::Error::Cancelled);
    }

    if let Some(err) = error.lock().unwrap().take() {
        let mut guard = workflow.lock().unwrap();
        guard.fail_request(invoke_context, err.to_string())?;
        return Err(err);
    }

    workflow.lock().unwrap().finish_request(invoke_context)
}

fn worker_loop(
    workflow: &Arc<Mutex<Workflow>>,
    invoke_context: &InvokeContext,
    in_flight: &Arc<Mutex<HashSet<String>>>,
    error: &Arc<Mutex<Option<crate::error::Error>>>,
    cancel: &CancellationToken,
    check_interval: Duration,
) {
    loop {
        if error.lock().unwrap().is_some() || cancel.is_cancelled() {
            return;
        }

        let ticket = {
            let mut guard = workflow.lock().unwrap();
            if guard.is_queue_empty() {
                let still_in_flight = !in_flight.lock().unwrap().is_empty();
                drop(guard);
                if !still_in_flight {
                    return;
                }
                std::thread::sleep(check_interval);
                continue;
            }
            match guard.begin_dispatch(invoke_context) {
                Ok(Some(ticket)) => ticket,
                Ok(None) => continue,
                Err(err) => {
                    *error.lock().unwrap() = Some(err);
                    return;
                }
            }
        };

        {
            let mut flight = in_flight.lock().unwrap();
            if !flight.insert(ticket.node_name.clone()) {
                // Another worker is already running this node; readiness
                // will re-fire once it completes, so just drop this
                // ticket's work back onto nothing — the node stays ready
                // and will be re-enqueued by on_event when its sibling
                // finishes. In practice `begin_dispatch` already serializes
                // under the workflow lock, so this path is defensive.
                continue;
            }
        }

        let node_name = ticket.node_name.clone();
        let outcome = ticket.command.run(invoke_context, &ticket.input);

        let complete_result = {
            let mut guard = workflow.lock().unwrap();
            guard.complete_dispatch(invoke_context, ticket, outcome)
        };

        in_flight.lock().unwrap().remove(&node_name);

        if let Err(err) = complete_result {
            *error.lock().unwrap() = Some(err);
            return;
        }
    }
}
