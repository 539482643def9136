//! Chat transcript: messages, directives, the event reducer, sessions, and
//! the turn driver.

mod directive;
mod message;
mod reducer;
mod session;
mod turn;

pub use directive::{
    DirectiveIntent, HighlightMarker, extract_context_update, find_highlight, resolve_player,
    strip_highlight,
};
pub use message::{Badges, Message, Role, ThinkingEntry, ThinkingKind, extract_badges};
pub use reducer::{Reduction, reduce};
pub use session::{
    DEFAULT_TITLE, NEW_CHAT_GREETING, Session, SessionStore, WELCOME_GREETING, derive_title,
};
pub use turn::{ChatState, ChatTransport, TRANSPORT_ERROR_TEXT, TurnObserver, TurnOutcome};
