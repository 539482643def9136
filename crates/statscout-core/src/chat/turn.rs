//! Chat turn driver.
//!
//! A turn appends the user message and an empty assistant message, then pulls
//! events from the response stream one at a time. Each event is reduced into a
//! new assistant message value that replaces the last entry of the session
//! before the next event is requested.
//!
//! [`ChatState::send_message`] takes `&mut self` for the whole turn, so only
//! one response stream can feed the state at a time.

use std::future::Future;

use futures_util::StreamExt;

use super::directive::DirectiveIntent;
use super::message::Message;
use super::reducer::reduce;
use super::session::SessionStore;
use crate::client::{ApiClient, ClientError, ClientResult};
use crate::dashboard::Dashboard;
use crate::stream::{ChatEvent, ChatEventStream};

/// Assistant text shown when the backend cannot be reached.
pub const TRANSPORT_ERROR_TEXT: &str =
    "**Error:** Could not reach the stats engine. Is the backend running?";

/// Opens chat response streams.
pub trait ChatTransport {
    fn open_stream(
        &self,
        message: &str,
    ) -> impl Future<Output = ClientResult<ChatEventStream>> + Send;
}

impl ChatTransport for ApiClient {
    async fn open_stream(&self, message: &str) -> ClientResult<ChatEventStream> {
        self.stream_chat(message).await
    }
}

/// Receives progress while a turn runs. All methods default to no-ops.
pub trait TurnObserver {
    /// Called after `event` has been reduced into `message`.
    fn on_event(&mut self, _event: &ChatEvent, _message: &Message) {}

    /// Called after a directive intent has been applied to the dashboard.
    fn on_intent(&mut self, _intent: &DirectiveIntent) {}

    /// Called once when the transport fails.
    fn on_transport_error(&mut self, _error: &ClientError) {}
}

impl TurnObserver for () {}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream ended normally.
    Completed,
    /// The request or the stream failed; the session got the fixed error message.
    TransportFailed,
    /// No session has the given id; nothing was sent.
    SessionNotFound,
}

/// Sessions plus the dashboard state the stream feeds.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub sessions: SessionStore,
    pub dashboard: Dashboard,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new chat: prepends a session and clears the highlighted player.
    pub fn new_chat(&mut self) -> String {
        self.dashboard.clear_highlight();
        self.sessions.create_session()
    }

    /// Runs one chat turn against session `session_id`.
    pub async fn send_message<T, O>(
        &mut self,
        transport: &T,
        session_id: &str,
        text: &str,
        observer: &mut O,
    ) -> TurnOutcome
    where
        T: ChatTransport + ?Sized,
        O: TurnObserver + ?Sized,
    {
        let started = self.sessions.append_or_mutate(session_id, |messages| {
            let mut next = messages.to_vec();
            next.push(Message::user(text));
            next.push(Message::pending_assistant());
            next
        });
        if !started {
            tracing::warn!(session_id, "Cannot send to unknown session");
            return TurnOutcome::SessionNotFound;
        }
        tracing::info!(session_id, "Chat turn started");

        let mut stream = match transport.open_stream(text).await {
            Ok(stream) => stream,
            Err(err) => {
                self.fail_turn(session_id, false, &err, observer);
                return TurnOutcome::TransportFailed;
            }
        };

        let mut received = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    received += 1;
                    self.apply_event(session_id, &event, observer);
                }
                Err(err) => {
                    self.fail_turn(session_id, received > 0, &err, observer);
                    return TurnOutcome::TransportFailed;
                }
            }
        }

        tracing::info!(session_id, events = received, "Chat turn completed");
        TurnOutcome::Completed
    }

    fn apply_event<O>(&mut self, session_id: &str, event: &ChatEvent, observer: &mut O)
    where
        O: TurnObserver + ?Sized,
    {
        let Some(current) = self
            .sessions
            .get(session_id)
            .and_then(|session| session.messages.last())
        else {
            return;
        };
        let reduction = reduce(current, event, &self.dashboard.live_players);

        let message = reduction.message;
        self.sessions.append_or_mutate(session_id, |messages| {
            let mut next = messages.to_vec();
            next.pop();
            next.push(message);
            next
        });

        for intent in &reduction.intents {
            self.dashboard.apply(intent);
            observer.on_intent(intent);
        }

        if let Some(message) = self
            .sessions
            .get(session_id)
            .and_then(|session| session.messages.last())
        {
            observer.on_event(event, message);
        }
    }

    /// Records a transport failure in the session.
    ///
    /// Before the first event the empty assistant message is dropped. After it,
    /// whatever was streamed stays and the error message follows it.
    fn fail_turn<O>(&mut self, session_id: &str, received: bool, err: &ClientError, observer: &mut O)
    where
        O: TurnObserver + ?Sized,
    {
        tracing::warn!(session_id, error = %err, received, "Chat turn failed");
        self.sessions.append_or_mutate(session_id, |messages| {
            let mut next = messages.to_vec();
            if !received {
                next.pop();
            }
            next.push(Message::assistant(TRANSPORT_ERROR_TEXT));
            next
        });
        observer.on_transport_error(err);
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use bytes::Bytes;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::chat::session::NEW_CHAT_GREETING;
    use crate::chat::ThinkingKind;
    use crate::client::ClientConfig;
    use crate::types::Player;

    enum Script {
        Body(&'static str),
        BodyThenReset(&'static str),
        Refused,
    }

    impl ChatTransport for Script {
        async fn open_stream(&self, _message: &str) -> ClientResult<ChatEventStream> {
            let chunks: Vec<Result<Bytes, io::Error>> = match self {
                Script::Refused => return Err(ClientError::transport("connection refused")),
                Script::Body(body) => vec![Ok(Bytes::from_static(body.as_bytes()))],
                Script::BodyThenReset(body) => vec![
                    Ok(Bytes::from_static(body.as_bytes())),
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
                ],
            };
            Ok(crate::stream::decode_events(futures_util::stream::iter(chunks)))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<ChatEvent>,
        intents: Vec<DirectiveIntent>,
        errors: usize,
    }

    impl TurnObserver for Recorder {
        fn on_event(&mut self, event: &ChatEvent, _message: &Message) {
            self.events.push(event.clone());
        }

        fn on_intent(&mut self, intent: &DirectiveIntent) {
            self.intents.push(intent.clone());
        }

        fn on_transport_error(&mut self, _error: &ClientError) {
            self.errors += 1;
        }
    }

    const TURN: &str = concat!(
        "data: {\"type\":\"thought\",\"content\":\"Check live context\"}\n\n",
        "data: {\"type\":\"action\",\"content\":\"Accessing tool: fetch_live_match_context\"}\n\n",
        "data: {\"type\":\"observation\",\"content\":\"{\\\"matches\\\":[{\\\"players\\\":[{\\\"id\\\":\\\"p7\\\",\\\"name\\\":\\\"Sikandar Raza\\\",\\\"wickets\\\":2}]}]}\"}\n\n",
        "data: {\"type\":\"answer\",\"content\":\"[HIGHLIGHT: Raza]Raza \"}\n\n",
        "data: {\"type\":\"answer\",\"content\":\"has 2 wickets.\"}\n\n",
    );

    #[tokio::test]
    async fn test_send_message_reduces_stream_into_session() {
        let mut state = ChatState::new();
        let id = state.sessions.active_id().to_string();
        let mut recorder = Recorder::default();

        let outcome = state
            .send_message(&Script::Body(TURN), &id, "Who is bowling?", &mut recorder)
            .await;

        assert_eq!(outcome, TurnOutcome::Completed);
        let session = state.sessions.get(&id).unwrap();
        assert_eq!(session.title(), "Who is bowling?");
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[1], Message::user("Who is bowling?"));

        let answer = &session.messages[2];
        assert!(answer.is_assistant());
        assert_eq!(answer.text, "Raza has 2 wickets.");
        let kinds: Vec<_> = answer.thinking.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ThinkingKind::Thought,
                ThinkingKind::Action,
                ThinkingKind::Observation
            ]
        );

        assert_eq!(state.dashboard.live_players.len(), 1);
        assert_eq!(state.dashboard.highlighted_player_id.as_deref(), Some("p7"));
        assert_eq!(recorder.events.len(), 5);
        assert_eq!(recorder.intents.len(), 2);
        assert_eq!(recorder.errors, 0);
    }

    #[tokio::test]
    async fn test_highlight_resolves_against_players_from_same_turn() {
        let mut state = ChatState::new();
        state.dashboard.live_players = vec![Player::new("stale", "Raza Senior")];
        let id = state.sessions.active_id().to_string();

        state.send_message(&Script::Body(TURN), &id, "q", &mut ()).await;
        assert_eq!(state.dashboard.highlighted_player_id.as_deref(), Some("p7"));
    }

    #[tokio::test]
    async fn test_failure_before_first_event_replaces_empty_message() {
        let mut state = ChatState::new();
        let id = state.sessions.active_id().to_string();
        let mut recorder = Recorder::default();

        let outcome = state
            .send_message(&Script::Refused, &id, "hello", &mut recorder)
            .await;

        assert_eq!(outcome, TurnOutcome::TransportFailed);
        let messages = &state.sessions.get(&id).unwrap().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("hello"));
        assert_eq!(messages[2], Message::assistant(TRANSPORT_ERROR_TEXT));
        assert_eq!(recorder.errors, 1);
    }

    #[tokio::test]
    async fn test_failure_mid_stream_keeps_partial_content() {
        let mut state = ChatState::new();
        let id = state.sessions.active_id().to_string();

        let outcome = state
            .send_message(
                &Script::BodyThenReset("data: {\"type\":\"answer\",\"content\":\"Kohli is on\"}\n"),
                &id,
                "Kohli?",
                &mut (),
            )
            .await;

        assert_eq!(outcome, TurnOutcome::TransportFailed);
        let messages = &state.sessions.get(&id).unwrap().messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].text, "Kohli is on");
        assert_eq!(messages[3], Message::assistant(TRANSPORT_ERROR_TEXT));
    }

    #[tokio::test]
    async fn test_send_to_inactive_session_leaves_active_alone() {
        let mut state = ChatState::new();
        let older = state.sessions.active_id().to_string();
        let newer = state.new_chat();

        state
            .send_message(&Script::Body(TURN), &older, "background", &mut ())
            .await;

        assert_eq!(state.sessions.active_id(), newer);
        assert_eq!(
            state.sessions.active().messages,
            vec![Message::assistant(NEW_CHAT_GREETING)]
        );
        assert_eq!(state.sessions.get(&older).unwrap().messages.len(), 3);
    }

    #[tokio::test]
    async fn test_send_to_unknown_session() {
        let mut state = ChatState::new();
        let outcome = state
            .send_message(&Script::Body(TURN), "missing", "hi", &mut ())
            .await;
        assert_eq!(outcome, TurnOutcome::SessionNotFound);
        assert_eq!(state.sessions.active().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_new_chat_clears_highlight() {
        let mut state = ChatState::new();
        let id = state.sessions.active_id().to_string();
        state.send_message(&Script::Body(TURN), &id, "q", &mut ()).await;
        assert!(state.dashboard.highlighted_player_id.is_some());

        let fresh = state.new_chat();
        assert_eq!(state.sessions.sessions()[0].id, fresh);
        assert_eq!(state.dashboard.highlighted_player_id, None);
        assert_eq!(state.dashboard.live_players.len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_status_fails_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;
        let client = ApiClient::new(ClientConfig {
            base_url: server.uri(),
            match_list_path: "/api/match-list".to_string(),
            connect_timeout: std::time::Duration::from_secs(5),
        })
        .unwrap();

        let mut state = ChatState::new();
        let id = state.sessions.active_id().to_string();
        let outcome = state.send_message(&client, &id, "hi", &mut ()).await;

        assert_eq!(outcome, TurnOutcome::TransportFailed);
        let last = state.sessions.active().messages.last().unwrap();
        assert_eq!(last.text, TRANSPORT_ERROR_TEXT);
    }
}
