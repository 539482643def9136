//! Plain-text rendering for the terminal.
//!
//! # Output contract
//! - Answer text streams to stdout.
//! - Thinking steps, directive notices, stream errors, and transport failures
//!   go to stderr, so `statscout ask -p ... > answer.txt` captures only the answer.

use std::fmt::Write as _;
use std::io::{Stderr, Stdout, Write, stderr, stdout};

use chrono::{DateTime, Local};
use statscout_core::chat::{DirectiveIntent, Message, Session, TurnObserver, extract_badges};
use statscout_core::client::ClientError;
use statscout_core::stream::ChatEvent;
use statscout_core::types::{Match, MatchList, Player, format_stat};

const PREVIEW_CHARS: usize = 160;

/// Streams a chat turn to stdout/stderr.
pub struct TurnRenderer {
    stdout: Stdout,
    stderr: Stderr,
    /// Bytes of the assistant text already written.
    printed: usize,
    /// Thinking entries already written.
    thinking_seen: usize,
    /// Whether the final newline has been printed after assistant output.
    needs_final_newline: bool,
}

impl Default for TurnRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnRenderer {
    pub fn new() -> Self {
        Self {
            stdout: stdout(),
            stderr: stderr(),
            printed: 0,
            thinking_seen: 0,
            needs_final_newline: false,
        }
    }

    /// Prints a final newline to stdout if needed (after assistant output completes).
    pub fn finish(&mut self) {
        self.end_answer_line();
    }

    fn end_answer_line(&mut self) {
        if self.needs_final_newline {
            let _ = writeln!(self.stdout);
            let _ = self.stdout.flush();
            self.needs_final_newline = false;
        }
    }
}

impl TurnObserver for TurnRenderer {
    fn on_event(&mut self, event: &ChatEvent, message: &Message) {
        match event {
            ChatEvent::Answer(_) => {
                let delta = message.text.get(self.printed..).unwrap_or_default();
                if !delta.is_empty() {
                    let _ = write!(self.stdout, "{delta}");
                    let _ = self.stdout.flush();
                    self.needs_final_newline = true;
                }
            }
            ChatEvent::Error(text) => {
                self.end_answer_line();
                if message.requires_approval {
                    let action = message.approval_action.as_deref().unwrap_or_default();
                    let _ = writeln!(self.stderr, "Approval required: {action}");
                } else {
                    let _ = writeln!(self.stderr, "Error: {text}");
                }
            }
            ChatEvent::Thought(_) | ChatEvent::Action(_) | ChatEvent::Observation(_) => {
                let new_entry = message
                    .thinking
                    .get(self.thinking_seen..)
                    .and_then(|added| added.last());
                if let Some(entry) = new_entry {
                    self.end_answer_line();
                    let _ = writeln!(
                        self.stderr,
                        "[{}] {}",
                        entry.kind,
                        preview(&entry.text, PREVIEW_CHARS)
                    );
                }
            }
        }
        self.printed = message.text.len();
        self.thinking_seen = message.thinking.len();
    }

    fn on_intent(&mut self, intent: &DirectiveIntent) {
        match intent {
            DirectiveIntent::ContextUpdate(players) => {
                let _ = writeln!(self.stderr, "Live players updated ({})", players.len());
            }
            DirectiveIntent::HighlightPlayer {
                name,
                player_id: Some(_),
            } => {
                let _ = writeln!(self.stderr, "Highlighted: {name}");
            }
            DirectiveIntent::HighlightPlayer { player_id: None, .. } => {}
        }
    }

    fn on_transport_error(&mut self, error: &ClientError) {
        self.end_answer_line();
        let _ = writeln!(self.stderr, "Error [{}]: {}", error.kind, error.message);
        if let Some(details) = &error.details {
            let _ = writeln!(self.stderr, "  Details: {details}");
        }
    }
}

/// First line of `text`, cut to `max` characters.
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut out: String = line.chars().take(max).collect();
    if line.chars().count() > max || text.lines().nth(1).is_some() {
        out.push_str("...");
    }
    out
}

/// Renders a stored message with badges pulled out of the text.
pub fn format_message(message: &Message) -> String {
    if message.is_user() {
        return format!("you> {}", message.text);
    }

    let (badges, text) = extract_badges(&message.text);
    let mut out = String::new();
    if badges.scouting_report {
        out.push_str("[Scouting Report] ");
    }
    if badges.knowledge_base {
        out.push_str("[Knowledge Base] ");
    }
    out.push_str(&text);
    if message.requires_approval {
        let action = message.approval_action.as_deref().unwrap_or_default();
        let _ = write!(out, "\n(approval required: {action}; /approve or /reject)");
    }
    out
}

/// Renders the whole transcript of a session.
pub fn format_transcript(session: &Session) -> String {
    let mut out = format!("== {} ==\n", session.title());
    for message in &session.messages {
        out.push_str(&format_message(message));
        out.push_str("\n\n");
    }
    out
}

/// Renders the live player table. The highlighted row is marked with `*`.
pub fn format_players(players: &[Player], highlighted_id: Option<&str>) -> String {
    if players.is_empty() {
        return "No live player data yet.\n".to_string();
    }

    let name_width = players
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!(
        "  {:<name_width$}  {:<12}  {:>5}  {:>5}  {:>7}  {:>3}  {:>6}\n",
        "Name", "Role", "R", "B", "SR", "W", "Econ"
    );
    for player in players {
        let marker = if highlighted_id == Some(player.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {:<name_width$}  {:<12}  {:>5}  {:>5}  {:>7}  {:>3}  {:>6}",
            player.name,
            player.role,
            format_stat(player.runs),
            format_stat(player.balls),
            format_stat(player.strike_rate),
            format_stat(player.wickets),
            format_stat(player.economy),
        );
    }
    out
}

/// Renders the match list as live/upcoming/recent sections.
pub fn format_match_list(list: &MatchList) -> String {
    if list.is_empty() {
        return "No matches available.\n".to_string();
    }

    let mut out = String::new();
    for (heading, matches) in [
        ("Live", &list.live),
        ("Upcoming", &list.upcoming),
        ("Recent", &list.recent),
    ] {
        if matches.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{heading}");
        for m in matches {
            let _ = writeln!(out, "  {}", format_match(m));
        }
    }
    out
}

fn format_match(m: &Match) -> String {
    let mut line = format!("{} vs {}", m.team1, m.team2);
    if !m.status.is_empty() {
        let _ = write!(line, " | {}", m.status);
    }
    if let Some(score) = m.score.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(line, " | {score}");
    }
    if let Some(result) = m.result.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(line, " | {result}");
    }
    if let Some(start) = m.start_time.as_deref() {
        let _ = write!(line, " | {}", format_start_time(start));
    }
    line
}

/// Local `HH:MM` for RFC 3339 times; anything else is shown as sent.
fn format_start_time(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
