//! Folds stream events into the assistant message of a turn.
//!
//! The reducer never touches session storage. It takes the current assistant
//! message by reference and returns the next value plus any directive intents
//! the event produced; the caller swaps the value into place and applies the
//! intents.

use serde::Deserialize;

use super::directive::{DirectiveIntent, extract_context_update, resolve_player, strip_highlight};
use super::message::{Message, ThinkingEntry, ThinkingKind};
use crate::stream::ChatEvent;
use crate::types::Player;

/// Result of reducing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// The assistant message after the event.
    pub message: Message,
    /// Side effects to apply to dashboard state, in order.
    pub intents: Vec<DirectiveIntent>,
}

/// Payload of an approval-gated pause, sent as error content.
#[derive(Debug, Deserialize)]
struct ApprovalRequest {
    status: String,
    #[serde(default)]
    action: Option<String>,
}

const APPROVAL_REQUIRED: &str = "approval_required";

/// Applies one event to `message`.
///
/// `players` is the current live-player list, read only to resolve highlight
/// names.
pub fn reduce(message: &Message, event: &ChatEvent, players: &[Player]) -> Reduction {
    let mut next = message.clone();
    let mut intents = Vec::new();

    match event {
        ChatEvent::Thought(text) => push_thinking(&mut next, ThinkingKind::Thought, text),
        ChatEvent::Action(text) => push_thinking(&mut next, ThinkingKind::Action, text),
        ChatEvent::Observation(text) => {
            push_thinking(&mut next, ThinkingKind::Observation, text);
            if let Some(update) = extract_context_update(text) {
                tracing::debug!(players = update.len(), "Live players replaced by observation");
                intents.push(DirectiveIntent::ContextUpdate(update));
            }
        }
        ChatEvent::Answer(fragment) => {
            // Only the new fragment is scanned so earlier markers never re-fire.
            let (cleaned, highlight) = strip_highlight(fragment);
            next.text.push_str(&cleaned);
            if let Some(name) = highlight {
                let player_id = resolve_player(&name, players).map(|p| p.id.clone());
                intents.push(DirectiveIntent::HighlightPlayer { name, player_id });
            }
        }
        ChatEvent::Error(text) => {
            next.text.push_str(&format!("\n[Error: {text}]"));
            if let Some(action) = approval_action(text) {
                next.requires_approval = true;
                next.approval_action = Some(action);
            }
        }
    }

    Reduction {
        message: next,
        intents,
    }
}

fn push_thinking(message: &mut Message, kind: ThinkingKind, text: &str) {
    let duplicate = message
        .thinking
        .last()
        .is_some_and(|last| last.kind == kind && last.text == text);
    if !duplicate {
        message.thinking.push(ThinkingEntry::new(kind, text));
    }
}

/// Returns the pending action when error content is an approval request.
fn approval_action(content: &str) -> Option<String> {
    let request: ApprovalRequest = serde_json::from_str(content).ok()?;
    if request.status != APPROVAL_REQUIRED {
        return None;
    }
    Some(request.action.unwrap_or_default())
}
