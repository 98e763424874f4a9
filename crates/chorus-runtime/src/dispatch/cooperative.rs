use chorus_types::InvokeContext;

use crate::cancellation::CancellationToken;
use crate::error::{Error, Result};
use crate::workflow::Workflow;

/// Single-threaded dispatch loop (spec §5.1): pop a node, run its command
/// to completion, record the outcome, repeat until the ready queue drains.
/// The loop is the sole mutator of topics, offsets, and the ready queue —
/// no locking is needed. `cancel` is checked before popping each ticket
/// (spec §5): once set, the request is failed rather than drained further.
pub fn drive(workflow: &mut Workflow, invoke_context: &InvokeContext, cancel: &CancellationToken) -> Result<()> {
    loop {
        if cancel.is_cancelled() {
            workflow.fail_request(invoke_context, "request cancelled".to_string())?;
            return Err(Error::Cancelled);
        }

        let ticket = match workflow.begin_dispatch(invoke_context) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => break,
            Err(err) => {
                workflow.fail_request(invoke_context, err.to_string())?;
                return Err(err);
            }
        };

        let outcome = ticket.command.run(invoke_context, &ticket.input);
        if let Err(err) = workflow.complete_dispatch(invoke_context, ticket, outcome) {
            workflow.fail_request(invoke_context, err.to_string())?;
            return Err(err);
        }
    }

    workflow.finish_request(invoke_context)
}
