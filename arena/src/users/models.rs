//! User record models.

use crate::tournament::models::GameId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User ID type (lower-cased wallet address)
pub type UserId = String;

/// Maximum username length in characters
pub const MAX_USERNAME_LEN: usize = 50;

/// Per-game counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub tournaments_played: u32,
    pub wins: u32,
}

/// Cumulative counters, mutated only on tournament completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_wins: u32,
    #[serde(default)]
    pub games: BTreeMap<GameId, GameStats>,
}

impl UserStats {
    pub fn game(&self, game_id: &str) -> GameStats {
        self.games.get(game_id).copied().unwrap_or_default()
    }
}

/// User record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub wallet_address: String,
    pub username: String,
    #[serde(default)]
    pub stats: UserStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(wallet_address: &str, username: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id(wallet_address),
            wallet_address: wallet_address.to_string(),
            username: username.to_string(),
            stats: UserStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Count a finished tournament for this user
    pub fn record_tournament(&mut self, game_id: &str, won: bool, now: DateTime<Utc>) {
        let game = self.stats.games.entry(game_id.to_string()).or_default();
        game.tournaments_played += 1;
        if won {
            game.wins += 1;
            self.stats.total_wins += 1;
        }
        self.updated_at = now;
    }

    /// Undo one `record_tournament` call
    pub fn revert_tournament(&mut self, game_id: &str, won: bool, now: DateTime<Utc>) {
        if let Some(game) = self.stats.games.get_mut(game_id) {
            game.tournaments_played = game.tournaments_played.saturating_sub(1);
            if won {
                game.wins = game.wins.saturating_sub(1);
                self.stats.total_wins = self.stats.total_wins.saturating_sub(1);
            }
        }
        self.updated_at = now;
    }
}

/// Derive the user id from a wallet address
pub fn user_id(wallet_address: &str) -> UserId {
    wallet_address.trim().to_lowercase()
}
