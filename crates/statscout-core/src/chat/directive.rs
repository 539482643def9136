//! In-band directives embedded in stream content.
//!
//! Two directives exist:
//! - `[HIGHLIGHT: <name>]` inside answer text asks the client to focus a player.
//! - An observation whose JSON has a `matches` array replaces the live players.
//!
//! A scan handles at most one highlight marker per fragment. Further markers in
//! the same fragment stay in the text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::types::Player;

static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[HIGHLIGHT: (.*?)\]").expect("highlight pattern is valid"));

/// Side effect requested by stream content.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveIntent {
    /// Focus a player. `player_id` is `None` when no known player matched.
    HighlightPlayer {
        name: String,
        player_id: Option<String>,
    },
    /// Replace the live player list.
    ContextUpdate(Vec<Player>),
}

/// First highlight marker found in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMarker<'a> {
    /// The whole marker, e.g. `[HIGHLIGHT: V. Kohli]`.
    pub marker: &'a str,
    /// The captured player name.
    pub name: &'a str,
}

/// Finds the first `[HIGHLIGHT: <name>]` marker in `text`.
pub fn find_highlight(text: &str) -> Option<HighlightMarker<'_>> {
    let captures = HIGHLIGHT_RE.captures(text)?;
    let marker = captures.get(0)?.as_str();
    let name = captures.get(1)?.as_str();
    Some(HighlightMarker { marker, name })
}

/// Removes the first highlight marker from `text`.
///
/// Returns the cleaned text and the captured name, if a marker was present.
pub fn strip_highlight(text: &str) -> (String, Option<String>) {
    match find_highlight(text) {
        Some(found) => (
            text.replacen(found.marker, "", 1),
            Some(found.name.to_string()),
        ),
        None => (text.to_string(), None),
    }
}

/// Resolves a highlight name against known players.
///
/// Case-insensitive substring containment on the display name; the first
/// match in list order wins.
pub fn resolve_player<'a>(name: &str, players: &'a [Player]) -> Option<&'a Player> {
    players.iter().find(|player| player.name_contains(name))
}

/// Extracts a live-player replacement from observation text.
///
/// Non-JSON text is ordinary tool output and yields `None`. JSON with a
/// non-empty `matches` array yields the first match's `players` (empty when
/// that field is missing or not an array). Every array element becomes a
/// player; an element that is not an object becomes a blank one.
pub fn extract_context_update(observation: &str) -> Option<Vec<Player>> {
    let data: Value = serde_json::from_str(observation).ok()?;
    let matches = data.get("matches")?.as_array()?;
    let first = matches.first()?;

    let players = first
        .get("players")
        .and_then(Value::as_array)
        .map(|players| {
            players
                .iter()
                .map(|player| {
                    Player::deserialize(player).unwrap_or_else(|err| {
                        tracing::debug!(error = %err, %player, "Unreadable player entry");
                        Player::default()
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(players)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_highlight() {
        let found = find_highlight("Watch [HIGHLIGHT: A Player] now").unwrap();
        assert_eq!(found.marker, "[HIGHLIGHT: A Player]");
        assert_eq!(found.name, "A Player");
    }

    #[test]
    fn test_find_highlight_is_non_greedy() {
        let found = find_highlight("[HIGHLIGHT: Kohli] and [HIGHLIGHT: Raza]").unwrap();
        assert_eq!(found.name, "Kohli");
    }

    #[test]
    fn test_strip_highlight_removes_only_first_marker() {
        let (text, name) = strip_highlight("[HIGHLIGHT: Kohli] then [HIGHLIGHT: Raza]");
        assert_eq!(text, " then [HIGHLIGHT: Raza]");
        assert_eq!(name.as_deref(), Some("Kohli"));
    }

    #[test]
    fn test_strip_highlight_without_marker() {
        let (text, name) = strip_highlight("[SCOUTING REPORT] no marker");
        assert_eq!(text, "[SCOUTING REPORT] no marker");
        assert_eq!(name, None);
    }

    #[test]
    fn test_resolve_player_first_match_wins() {
        let players = vec![
            Player::new("p1", "Sikandar Raza"),
            Player::new("p2", "Virat Kohli"),
            Player::new("p3", "Kohli Junior"),
        ];
        assert_eq!(resolve_player("kohli", &players).unwrap().id, "p2");
        assert_eq!(resolve_player("RAZA", &players).unwrap().id, "p1");
        assert!(resolve_player("Bumrah", &players).is_none());
    }

    #[test]
    fn test_extract_context_update() {
        let players = extract_context_update(
            r#"{"matches":[{"players":[{"id":"p1","name":"A Player"}]}]}"#,
        )
        .unwrap();
        assert_eq!(players, vec![Player::new("p1", "A Player")]);
    }

    #[test]
    fn test_extract_context_update_keeps_every_entry() {
        let players = extract_context_update(
            r#"{"matches":[{"players":[
                {"id":"p1","name":"A Player"},
                {"id":"p2","name":"B Player","runs":"45"},
                {"id":7,"name":"C Player"},
                "not a player"
            ]}]}"#,
        )
        .unwrap();

        let ids: Vec<_> = players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2", "7", ""]);
        assert_eq!(players[1].runs, Some(45.0));
        assert_eq!(players[3], Player::default());
    }

    #[test]
    fn test_extract_context_update_uses_first_match_only() {
        let players = extract_context_update(
            r#"{"matches":[{"players":[{"id":"p1","name":"One"}]},{"players":[{"id":"p2","name":"Two"}]}]}"#,
        )
        .unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, "p1");
    }

    #[test]
    fn test_extract_context_update_missing_players_is_empty() {
        let players = extract_context_update(r#"{"matches":[{"id":"m1"}]}"#).unwrap();
        assert!(players.is_empty());
    }

    #[test]
    fn test_extract_context_update_ignores_other_payloads() {
        assert_eq!(extract_context_update("**Mathematical Win Probability**: 61.2%"), None);
        assert_eq!(extract_context_update(r#"{"message":"No live matches."}"#), None);
        assert_eq!(extract_context_update(r#"{"matches":"none"}"#), None);
        assert_eq!(extract_context_update(r#"{"matches":[]}"#), None);
    }
}
