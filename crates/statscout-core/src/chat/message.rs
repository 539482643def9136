//! Conversation messages and the thinking log.

use std::fmt;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Kind of a thinking log step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingKind {
    Thought,
    Action,
    Observation,
}

impl fmt::Display for ThinkingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThinkingKind::Thought => write!(f, "thought"),
            ThinkingKind::Action => write!(f, "action"),
            ThinkingKind::Observation => write!(f, "observation"),
        }
    }
}

/// One intermediate step of an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingEntry {
    pub kind: ThinkingKind,
    pub text: String,
}

impl ThinkingEntry {
    pub fn new(kind: ThinkingKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A chat message.
///
/// User messages are complete when created. Assistant messages are rebuilt
/// event by event during a turn (see [`crate::chat::reduce`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub thinking: Vec<ThinkingEntry>,
    /// Set when the backend paused on an approval-gated action.
    pub requires_approval: bool,
    /// The action awaiting approval.
    pub approval_action: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text.into())
    }

    /// The empty accumulator an assistant turn starts from.
    pub fn pending_assistant() -> Self {
        Self::assistant(String::new())
    }

    fn new(role: Role, text: String) -> Self {
        Self {
            role,
            text,
            thinking: Vec::new(),
            requires_approval: false,
            approval_action: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Badges detected in assistant text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Badges {
    pub scouting_report: bool,
    pub knowledge_base: bool,
}

const SCOUTING_REPORT_TAG: &str = "[SCOUTING REPORT]";
const KNOWLEDGE_BASE_TAG: &str = "[SOURCE: KNOWLEDGE_BASE]";

/// Splits badge tags out of message text for display.
///
/// Only the first occurrence of each tag is removed; the stored message text
/// is left untouched.
pub fn extract_badges(text: &str) -> (Badges, String) {
    let badges = Badges {
        scouting_report: text.contains(SCOUTING_REPORT_TAG),
        knowledge_base: text.contains(KNOWLEDGE_BASE_TAG),
    };
    let cleaned = text
        .replacen(SCOUTING_REPORT_TAG, "", 1)
        .replacen(KNOWLEDGE_BASE_TAG, "", 1)
        .trim()
        .to_string();
    (badges, cleaned)
}
