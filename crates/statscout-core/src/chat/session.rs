//! In-memory conversation sessions.
//!
//! Sessions are kept newest-first. Each one sits behind an `Arc` so an update
//! to one session rebuilds only that entry; every other entry keeps its
//! allocation and compares equal with `Arc::ptr_eq`.

use std::sync::Arc;

use uuid::Uuid;

use super::message::Message;

/// Greeting of the session that exists at startup.
pub const WELCOME_GREETING: &str = "Hello! I am StatsScout, your AI cricket analyst. Ask me about **live matches**, **player stats**, or **win predictions**!";

/// Greeting of every session created afterwards.
pub const NEW_CHAT_GREETING: &str = "Hello! I am StatsScout. Ready for a new match analysis!";

/// Title shown until the first user message arrives.
pub const DEFAULT_TITLE: &str = "New Chat";

const TITLE_MAX_CHARS: usize = 25;

/// One conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Derived once from the first user message, then fixed.
    title: Option<String>,
    pub messages: Vec<Message>,
}

impl Session {
    fn with_greeting(greeting: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: None,
            messages: vec![Message::assistant(greeting)],
        }
    }

    /// Display title.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

/// Derives a session title from message text.
///
/// Keeps the first 25 characters and appends `...` when text was cut.
pub fn derive_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

/// Ordered session collection with exactly one active session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Vec<Arc<Session>>,
    active_id: String,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store holding a single welcome session, which is active.
    pub fn new() -> Self {
        let session = Session::with_greeting(WELCOME_GREETING);
        let active_id = session.id.clone();
        Self {
            sessions: vec![Arc::new(session)],
            active_id,
        }
    }

    /// Prepends a new session, makes it active, and returns its id.
    ///
    /// Dashboard state is not owned here; [`super::ChatState::new_chat`]
    /// also clears the highlighted player.
    pub fn create_session(&mut self) -> String {
        let session = Session::with_greeting(NEW_CHAT_GREETING);
        let id = session.id.clone();
        self.sessions.insert(0, Arc::new(session));
        self.active_id.clone_from(&id);
        tracing::debug!(session_id = %id, "Created session");
        id
    }

    /// Makes `id` the active session.
    ///
    /// An unknown id is not an error: the first session becomes active.
    pub fn select_session(&mut self, id: &str) {
        if self.get(id).is_some() {
            self.active_id = id.to_string();
            return;
        }
        tracing::debug!(session_id = id, "Unknown session, falling back to first");
        if let Some(first) = self.sessions.first() {
            self.active_id.clone_from(&first.id);
        }
    }

    /// Replaces the messages of session `id` with `updater(messages)`.
    ///
    /// Derives the title if it is still unset and a user message now exists.
    /// Returns false when no session has that id.
    pub fn append_or_mutate<F>(&mut self, id: &str, updater: F) -> bool
    where
        F: FnOnce(&[Message]) -> Vec<Message>,
    {
        let Some(slot) = self.sessions.iter_mut().find(|s| s.id == id) else {
            tracing::debug!(session_id = id, "Update for unknown session ignored");
            return false;
        };

        let messages = updater(&slot.messages);
        let title = slot.title.clone().or_else(|| {
            messages
                .iter()
                .find(|m| m.is_user())
                .map(|m| derive_title(&m.text))
        });

        *slot = Arc::new(Session {
            id: slot.id.clone(),
            title,
            messages,
        });
        true
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active session.
    pub fn active(&self) -> &Session {
        self.get(&self.active_id)
            .or_else(|| self.sessions.first().map(Arc::as_ref))
            .unwrap_or_else(|| unreachable!("store always holds a session"))
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id).map(Arc::as_ref)
    }

    /// Sessions in display order (newest first).
    pub fn sessions(&self) -> &[Arc<Session>] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
