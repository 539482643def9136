//! Interactive chat loop on stdin.
//!
//! Plain lines are sent as messages to the active session. Lines starting with
//! `/` are local commands. Turns run one at a time: the next line is not read
//! until the current response stream has ended.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use statscout_core::chat::{ChatState, Session, SessionStore, TurnOutcome};
use statscout_core::client::ApiClient;
use statscout_core::config::Config;
use statscout_core::poller::MatchListPoller;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::render::{self, TurnRenderer};

const HELP: &str = "\
Commands:
  /new              Start a new chat
  /sessions         List chats (newest first)
  /switch <n|id>    Switch to chat number n or chat id
  /players          Show live players
  /matches          Show live, upcoming, and recent matches
  /approve          Approve the pending action
  /reject           Reject the pending action
  /help             Show this help
  /quit             Exit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Empty,
    Message(String),
    New,
    Sessions,
    Switch(Option<String>),
    Players,
    Matches,
    Approve,
    Reject,
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (command, None),
    };
    match name {
        "new" => Input::New,
        "sessions" => Input::Sessions,
        "switch" => Input::Switch(arg.map(str::to_string)),
        "players" => Input::Players,
        "matches" => Input::Matches,
        "approve" => Input::Approve,
        "reject" => Input::Reject,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

/// Maps a 1-based list position to a session id; anything else is taken as an id.
fn resolve_switch_target(store: &SessionStore, arg: &str) -> String {
    if let Ok(position) = arg.parse::<usize>()
        && let Some(session) = position
            .checked_sub(1)
            .and_then(|index| store.sessions().get(index))
    {
        return session.id.clone();
    }
    arg.to_string()
}

/// The action awaiting approval in `session`, if its last reply asked for one.
fn pending_approval(session: &Session) -> Option<String> {
    session
        .messages
        .last()
        .filter(|m| m.is_assistant() && m.requires_approval)
        .map(|m| m.approval_action.clone().unwrap_or_default())
}

fn clear_approval(store: &mut SessionStore, session_id: &str) {
    store.append_or_mutate(session_id, |messages| {
        let mut next = messages.to_vec();
        if let Some(last) = next.last_mut() {
            last.requires_approval = false;
            last.approval_action = None;
        }
        next
    });
}

fn format_sessions(store: &SessionStore) -> String {
    store
        .sessions()
        .iter()
        .enumerate()
        .map(|(index, session)| {
            let marker = if session.id == store.active_id() { '*' } else { ' ' };
            let short_id: String = session.id.chars().take(8).collect();
            format!("{marker} {}. {} ({short_id})\n", index + 1, session.title())
        })
        .collect()
}

async fn send(state: &mut ChatState, client: &ApiClient, text: &str) {
    let session_id = state.sessions.active_id().to_string();
    let mut renderer = TurnRenderer::new();
    let outcome = state
        .send_message(client, &session_id, text, &mut renderer)
        .await;
    renderer.finish();

    if outcome == TurnOutcome::TransportFailed
        && let Some(last) = state
            .sessions
            .get(&session_id)
            .and_then(|s| s.messages.last())
    {
        println!("{}", render::format_message(last));
    }
}

fn show_prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

pub async fn run(client: &ApiClient, config: &Config) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    run_with_input(client, config.match_refresh_interval(), input).await
}

/// The chat loop over any line source. The poller is shut down on every exit path.
async fn run_with_input<R>(client: &ApiClient, refresh: Duration, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut state = ChatState::new();
    let poller = MatchListPoller::spawn(client.clone(), refresh);
    let mut lines = input.lines();

    println!("StatsScout @ {} (type /help for commands)\n", client.base_url());
    print!("{}", render::format_transcript(state.sessions.active()));

    loop {
        show_prompt();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                println!();
                break;
            }
            Err(e) => {
                poller.shutdown().await;
                return Err(e).context("read input");
            }
        };
        state.dashboard.set_matches(poller.latest());

        match parse_input(&line) {
            Input::Empty => {}
            Input::Message(text) => send(&mut state, client, &text).await,
            Input::New => {
                state.new_chat();
                print!("{}", render::format_transcript(state.sessions.active()));
            }
            Input::Sessions => print!("{}", format_sessions(&state.sessions)),
            Input::Switch(None) => println!("Usage: /switch <n|id>"),
            Input::Switch(Some(arg)) => {
                let target = resolve_switch_target(&state.sessions, &arg);
                state.sessions.select_session(&target);
                if state.sessions.active_id() != target {
                    println!("No chat '{arg}', showing the most recent one.");
                }
                print!("{}", render::format_transcript(state.sessions.active()));
            }
            Input::Players => print!(
                "{}",
                render::format_players(
                    &state.dashboard.live_players,
                    state.dashboard.highlighted_player().map(|p| p.id.as_str()),
                )
            ),
            Input::Matches => print!("{}", render::format_match_list(&state.dashboard.matches)),
            Input::Approve => {
                let session_id = state.sessions.active_id().to_string();
                match pending_approval(state.sessions.active()) {
                    Some(action) => {
                        clear_approval(&mut state.sessions, &session_id);
                        let text = format!("I approve. Proceed with: {action}");
                        send(&mut state, client, &text).await;
                    }
                    None => println!("Nothing is waiting for approval."),
                }
            }
            Input::Reject => {
                let session_id = state.sessions.active_id().to_string();
                if pending_approval(state.sessions.active()).is_some() {
                    clear_approval(&mut state.sessions, &session_id);
                    println!("Action rejected.");
                } else {
                    println!("Nothing is waiting for approval.");
                }
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(name) => println!("Unknown command /{name}. Type /help for commands."),
        }
    }

    poller.shutdown().await;
    Ok(())
}
