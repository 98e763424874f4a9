use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chorus_engine::Topic;
use chorus_types::{Event, InvokeContext, Message};
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::config::{Config, DispatchMode};
use crate::dispatch::{cooperative, parallel};
use crate::error::{Error, Result};
use crate::reserved::{AGENT_OUTPUT_TOPIC, HUMAN_REQUEST_TOPIC};
use crate::workflow::Workflow;

/// The assistant-facing surface a CLI or service sits behind: feeds the
/// reserved input topic, drives dispatch, and drains the reserved output
/// topic (spec §1 "user-facing assistant façade... out of scope beyond
/// its interface" — this is that thin layer, the way `agtrace_runtime`'s
/// `client::AgTrace` sits behind `agtrace-cli`).
pub struct Facade {
    workflow: Arc<Mutex<Workflow>>,
    config: Config,
    /// One [`CancellationToken`] per in-flight `assistant_request_id`
    /// (spec §5), registered for the duration of a `drive` call so
    /// [`Facade::cancel`] can reach a request from another thread.
    cancellations: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl Facade {
    pub fn new(workflow: Workflow, config: Config) -> Self {
        Self {
            workflow: Arc::new(Mutex::new(workflow)),
            config,
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    /// Cancels the in-flight request identified by `assistant_request_id`,
    /// if one is currently being driven (spec §5). A no-op if the request
    /// is not currently dispatching — e.g. it already finished, or is
    /// paused awaiting a human reply between calls to [`Facade::resume`].
    pub fn cancel(&self, assistant_request_id: Uuid) -> Result<()> {
        let cancellations = self.cancellations.lock().map_err(lock_poisoned)?;
        if let Some(token) = cancellations.get(&assistant_request_id) {
            token.cancel();
        }
        Ok(())
    }

    /// Starts (or resumes, if the store already has events for this
    /// request) a request, then drives the ready queue to drain using the
    /// configured dispatch mode.
    pub fn invoke(&self, invoke_context: &InvokeContext, input_messages: Vec<Message>) -> Result<()> {
        {
            let mut workflow = self.workflow.lock().map_err(lock_poisoned)?;
            workflow.initialize(invoke_context, input_messages)?;
        }
        self.drive(invoke_context)
    }

    /// Appends a user reply to a `HumanRequestTopic` and drives dispatch
    /// again (spec §4.5 "the invoke_context can be passed back later").
    pub fn resume(
        &self,
        invoke_context: &InvokeContext,
        topic_name: &str,
        parent_event_id: Uuid,
        reply: Vec<Message>,
    ) -> Result<()> {
        {
            let mut workflow = self.workflow.lock().map_err(lock_poisoned)?;
            workflow.append_user_input(invoke_context, topic_name, parent_event_id, reply)?;
        }
        self.drive(invoke_context)
    }

    fn drive(&self, invoke_context: &InvokeContext) -> Result<()> {
        let request_id = invoke_context.assistant_request_id;
        let cancel = CancellationToken::new();
        self.cancellations
            .lock()
            .map_err(lock_poisoned)?
            .insert(request_id, cancel.clone());

        let result = match self.config.dispatch_mode {
            DispatchMode::Cooperative => {
                let mut workflow = self.workflow.lock().map_err(lock_poisoned)?;
                cooperative::drive(&mut workflow, invoke_context, &cancel)
            }
            DispatchMode::Parallel => parallel::drive(
                Arc::clone(&self.workflow),
                invoke_context,
                self.config.worker_count,
                cancel,
                self.config.cancellation_check_interval(),
            ),
        };

        self.cancellations
            .lock()
            .map_err(lock_poisoned)?
            .remove(&request_id);

        result
    }

    /// Drains the reserved output topic for `consumer_name` — the
    /// façade's own read offset into `agent_output_topic` (spec §6:
    /// "consumer: the façade only").
    pub fn drain_output(&self, consumer_name: &str) -> Result<Vec<Event>> {
        self.drain_topic(AGENT_OUTPUT_TOPIC, consumer_name)
    }

    /// Drains any pending ask-the-user `OutputTopic` events from the
    /// reserved human-request topic, so a caller can decide whether a
    /// reply is needed before calling [`Facade::resume`].
    pub fn drain_human_requests(&self, consumer_name: &str) -> Result<Vec<Event>> {
        self.drain_topic(HUMAN_REQUEST_TOPIC, consumer_name)
    }

    fn drain_topic(&self, topic_name: &str, consumer_name: &str) -> Result<Vec<Event>> {
        let mut workflow = self.workflow.lock().map_err(lock_poisoned)?;
        Ok(workflow.consume_as_facade(topic_name, consumer_name))
    }

    pub fn with_topic(&self, topic_name: &str, f: impl FnOnce(&Topic)) -> Result<()> {
        let workflow = self.workflow.lock().map_err(lock_poisoned)?;
        if let Some(topic) = workflow.topic(topic_name) {
            f(topic);
        }
        Ok(())
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> Error {
    Error::InvalidOperation("workflow lock poisoned by a panicking worker".to_string())
}
