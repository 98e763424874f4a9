use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the participant that produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A request, embedded in an assistant [`Message`], asking a downstream
/// function-call node to execute a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Message content. Kept as a typed union rather than a bare string so
/// structured tool output (JSON payloads) round-trips without re-parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content_type", content = "content_data")]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Structured(serde_json::Value),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    /// Best-effort plain-text view, used by ancestor-graph consumers that
    /// only care about a flattened transcript.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Structured(v) => v.to_string(),
        }
    }
}

/// Immutable conversational unit with identity, timestamp, role, content,
/// and optional tool-call references.
///
/// `message_id` is stable across serialization; `timestamp` strictly orders
/// messages produced by the same clock (see `chorus_core::Clock`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub timestamp: i64,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(message_id: Uuid, timestamp: i64, role: Role) -> Self {
        Self {
            message_id,
            timestamp,
            role,
            content: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
            name: None,
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_tool_call_id(mut self, id: Uuid) -> Self {
        self.tool_call_id = Some(id);
        self
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = calls;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True when this message requests one or more tool invocations,
    /// the signal function-call nodes filter on (spec §6).
    pub fn requests_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// True when this message is a tool response keyed to an original call.
    pub fn is_tool_response(&self) -> bool {
        self.tool_call_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let msg = Message::new(Uuid::nil(), 1, Role::Assistant)
            .with_content(Content::text("hi"))
            .with_tool_calls(vec![ToolCallRequest {
                id: Uuid::nil(),
                name: "search".into(),
                arguments: serde_json::json!({"q": "rust"}),
            }]);

        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn detects_tool_call_requests() {
        let msg = Message::new(Uuid::nil(), 1, Role::Assistant).with_tool_calls(vec![
            ToolCallRequest {
                id: Uuid::nil(),
                name: "search".into(),
                arguments: serde_json::Value::Null,
            },
        ]);
        assert!(msg.requests_tool_calls());
        assert!(!msg.is_tool_response());
    }
}
