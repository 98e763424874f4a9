use chorus_engine::{Command, CommandError};
use chorus_types::{Content, InvokeContext, Message, Role};
use uuid::Uuid;

pub fn sample_invoke_context() -> InvokeContext {
    InvokeContext::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
}

pub fn user_message(text: &str) -> Message {
    Message::new(Uuid::new_v4(), 0, Role::User).with_content(Content::text(text))
}

pub fn assistant_message(text: &str) -> Message {
    Message::new(Uuid::new_v4(), 0, Role::Assistant).with_content(Content::text(text))
}

/// The simplest possible [`Command`]: always returns the same fixed
/// reply, ignoring its input entirely. Used by scenario tests that only
/// need to exercise the dispatch loop, not an actual model call.
pub struct EchoCommand {
    pub reply: String,
}

impl EchoCommand {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

impl Command for EchoCommand {
    fn run(
        &self,
        _ctx: &InvokeContext,
        _input: &[chorus_types::ConsumeRecord],
    ) -> Result<Vec<Message>, CommandError> {
        Ok(vec![assistant_message(&self.reply)])
    }
}

/// Wraps a plain closure as a [`Command`] for scenario tests that need
/// per-call behavior (stateful counters, conditional failure) without
/// writing a new struct each time.
pub struct FnCommand<F>
where
    F: Fn(&InvokeContext, &[chorus_types::ConsumeRecord]) -> Result<Vec<Message>, CommandError>
        + Send
        + Sync,
{
    f: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&InvokeContext, &[chorus_types::ConsumeRecord]) -> Result<Vec<Message>, CommandError>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&InvokeContext, &[chorus_types::ConsumeRecord]) -> Result<Vec<Message>, CommandError>
        + Send
        + Sync,
{
    fn run(
        &self,
        ctx: &InvokeContext,
        input: &[chorus_types::ConsumeRecord],
    ) -> Result<Vec<Message>, CommandError> {
        (self.f)(ctx, input)
    }
}
