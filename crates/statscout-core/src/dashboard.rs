//! Derived UI state fed by directives and the match-list poller.

use crate::chat::DirectiveIntent;
use crate::types::{MatchList, Player};

/// Live players, the highlighted player, and the latest match list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub live_players: Vec<Player>,
    pub highlighted_player_id: Option<String>,
    pub matches: MatchList,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a directive intent.
    ///
    /// A highlight whose name did not resolve to a known player is ignored.
    pub fn apply(&mut self, intent: &DirectiveIntent) {
        match intent {
            DirectiveIntent::ContextUpdate(players) => {
                self.live_players.clone_from(players);
            }
            DirectiveIntent::HighlightPlayer { name, player_id } => match player_id {
                Some(id) => self.highlighted_player_id = Some(id.clone()),
                None => tracing::debug!(name, "Highlight did not match a live player"),
            },
        }
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted_player_id = None;
    }

    pub fn set_matches(&mut self, matches: MatchList) {
        self.matches = matches;
    }

    /// The highlighted player, if it is still in the live list.
    pub fn highlighted_player(&self) -> Option<&Player> {
        let id = self.highlighted_player_id.as_deref()?;
        self.live_players.iter().find(|p| p.id == id)
    }
}
