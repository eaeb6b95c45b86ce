//! Games: the catalog of games tournaments can be created for, and pluggable
//! rules for games the engine can referee move by move.
//!
//! Most games are played outside the engine and only report a final score.
//! A game with registered [`GameRules`] can additionally be played through
//! the engine; a decisive terminal position finalizes the match the same way
//! an agreed score does.

use crate::{
    bracket::models::Seat,
    tournament::{
        errors::TournamentResult,
        models::GameId,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

pub mod tictactoe;

pub use tictactoe::TicTacToe;

/// A game tournaments can be held for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDefinition {
    pub id: GameId,
    pub name: String,
}

impl GameDefinition {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Known games, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCatalog {
    games: Vec<GameDefinition>,
}

impl GameCatalog {
    pub fn new(games: Vec<GameDefinition>) -> Self {
        Self { games }
    }

    pub fn get(&self, game_id: &str) -> Option<&GameDefinition> {
        self.games.iter().find(|g| g.id == game_id)
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.get(game_id).is_some()
    }

    pub fn list(&self) -> &[GameDefinition] {
        &self.games
    }
}

impl Default for GameCatalog {
    fn default() -> Self {
        Self::new(vec![
            GameDefinition::new("fifa", "FIFA"),
            GameDefinition::new("cod", "Call of Duty"),
            GameDefinition::new("chess", "Chess"),
            GameDefinition::new(tictactoe::GAME_ID, "TikTakToe"),
        ])
    }
}

/// Terminal position of a refereed game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Winner(Seat),
    /// No winner possible; the match restarts from a fresh state
    Draw,
}

/// Rules for a game the engine referees
///
/// State and moves are opaque JSON so the match document can carry any game.
pub trait GameRules: Send + Sync {
    /// Initial state for a match; player1 always moves first
    fn new_state(&self, now: DateTime<Utc>) -> TournamentResult<serde_json::Value>;

    /// Check a move by `seat` against `state` without applying it
    ///
    /// # Errors
    ///
    /// * `InvalidState` - not this seat's turn, or the position is terminal
    /// * `Validation` - malformed or illegal move
    fn validate_move(&self, state: &serde_json::Value, seat: Seat, mv: &serde_json::Value) -> TournamentResult<()>;

    /// Apply a validated move and return the next state
    fn apply_move(
        &self,
        state: serde_json::Value,
        seat: Seat,
        mv: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> TournamentResult<serde_json::Value>;

    fn detect_terminal(&self, state: &serde_json::Value) -> TournamentResult<Option<Terminal>>;
}

/// Game rules keyed by game id
#[derive(Clone, Default)]
pub struct RulesRegistry {
    rules: HashMap<GameId, Arc<dyn GameRules>>,
}

impl RulesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in game
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(tictactoe::GAME_ID, Arc::new(TicTacToe));
        registry
    }

    pub fn register(&mut self, game_id: &str, rules: Arc<dyn GameRules>) {
        self.rules.insert(game_id.to_string(), rules);
    }

    pub fn get(&self, game_id: &str) -> Option<Arc<dyn GameRules>> {
        self.rules.get(game_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = GameCatalog::default();
        assert_eq!(catalog.list().len(), 4);
        assert_eq!(catalog.get("cod").map(|g| g.name.as_str()), Some("Call of Duty"));
        assert!(!catalog.contains("checkers"));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = RulesRegistry::with_builtin();
        assert!(registry.get(tictactoe::GAME_ID).is_some());
        assert!(registry.get("fifa").is_none());
    }
}
