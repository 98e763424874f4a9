/// Producer: the façade. Consumer: any node whose subscription references
/// it. Carries the initial user messages (spec §6).
pub const AGENT_INPUT_TOPIC: &str = "agent_input_topic";

/// Producer: any node publishing user-facing final content. Consumer: the
/// façade only. Emits `OutputTopic` events (spec §6).
pub const AGENT_OUTPUT_TOPIC: &str = "agent_output_topic";

/// Optional variant of [`AGENT_OUTPUT_TOPIC`] for incremental output.
pub const AGENT_STREAM_OUTPUT_TOPIC: &str = "agent_stream_output_topic";

/// Producer: nodes requesting user input, as `OutputTopic` events. Also
/// accepts user replies appended via `append_user_input` as standard
/// `PublishToTopic` events (spec §6).
pub const HUMAN_REQUEST_TOPIC: &str = "human_request_topic";

pub fn is_reserved_output_topic(name: &str) -> bool {
    name == AGENT_OUTPUT_TOPIC || name == AGENT_STREAM_OUTPUT_TOPIC
}
