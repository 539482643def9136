//! Chat stream event types.
//!
//! Every `data: ` frame of the `/chat` response carries one JSON object with a
//! `type` tag and a `content` payload. This module turns a single frame into a
//! [`ChatEvent`].

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Prefix that marks a frame carrying an event.
pub const DATA_PREFIX: &str = "data: ";

/// Kind of an incoming stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Thought,
    Action,
    Observation,
    Answer,
    Error,
}

impl EventKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "thought" => Some(Self::Thought),
            "action" => Some(Self::Action),
            "observation" => Some(Self::Observation),
            "answer" => Some(Self::Answer),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Thought => write!(f, "thought"),
            EventKind::Action => write!(f, "action"),
            EventKind::Observation => write!(f, "observation"),
            EventKind::Answer => write!(f, "answer"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

/// One decoded unit from the chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Intermediate reasoning from the agent.
    Thought(String),
    /// The agent is invoking a tool.
    Action(String),
    /// Raw tool output (may be JSON).
    Observation(String),
    /// A fragment of the final answer text.
    Answer(String),
    /// A non-fatal error reported by the backend.
    Error(String),
}

impl ChatEvent {
    pub fn new(kind: EventKind, content: impl Into<String>) -> Self {
        let content = content.into();
        match kind {
            EventKind::Thought => Self::Thought(content),
            EventKind::Action => Self::Action(content),
            EventKind::Observation => Self::Observation(content),
            EventKind::Answer => Self::Answer(content),
            EventKind::Error => Self::Error(content),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::Thought(_) => EventKind::Thought,
            ChatEvent::Action(_) => EventKind::Action,
            ChatEvent::Observation(_) => EventKind::Observation,
            ChatEvent::Answer(_) => EventKind::Answer,
            ChatEvent::Error(_) => EventKind::Error,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatEvent::Thought(text)
            | ChatEvent::Action(text)
            | ChatEvent::Observation(text)
            | ChatEvent::Answer(text)
            | ChatEvent::Error(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
}

/// Parses one line of the response body.
///
/// Returns `None` for lines without the `data: ` prefix, unparsable JSON, and
/// unknown event types. A bad frame never aborts the stream.
pub fn parse_frame(line: &str) -> Option<ChatEvent> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        if !line.trim().is_empty() {
            tracing::debug!(line, "Skipping frame without data prefix");
        }
        return None;
    };

    let wire: WireEvent = match serde_json::from_str(payload) {
        Ok(wire) => wire,
        Err(err) => {
            tracing::warn!(error = %err, frame = payload, "Failed to parse stream frame");
            return None;
        }
    };

    let Some(kind) = EventKind::parse(&wire.kind) else {
        tracing::debug!(kind = %wire.kind, "Skipping unknown event type");
        return None;
    };

    let content = match wire.content {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    };

    Some(ChatEvent::new(kind, content))
}
