//! Auto-tournament scheduler configuration.

use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{AUTO_START_SIZES, GameId},
};
use std::time::Duration;

/// Games kept supplied with open auto-tournaments by default
pub const DEFAULT_GAMES: [&str; 4] = ["fifa", "cod", "chess", "tiktaktoe"];

/// Bracket sizes kept open per game by default
pub const DEFAULT_SIZES: [u32; 4] = [2, 4, 8, 16];

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Games to keep open auto-tournaments for
    pub games: Vec<GameId>,

    /// Bracket sizes per game
    pub sizes: Vec<u32>,

    /// Period of the cleanup and top-up pass
    pub cleanup_interval: Duration,

    /// How long finished auto-tournaments are kept
    pub retention: Duration,

    /// Delay between a completion and creating its replacement
    pub replacement_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            games: DEFAULT_GAMES.iter().map(|g| g.to_string()).collect(),
            sizes: DEFAULT_SIZES.to_vec(),
            cleanup_interval: Duration::from_secs(6 * 60 * 60),
            retention: Duration::from_secs(24 * 60 * 60),
            replacement_delay: Duration::from_secs(1),
        }
    }
}

impl SchedulerConfig {
    /// Every configured (game, size) pair
    pub fn pairs(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.games
            .iter()
            .flat_map(|game| self.sizes.iter().map(move |&size| (game.as_str(), size)))
    }

    /// # Errors
    ///
    /// * `Validation` - a size is not an allowed bracket size, or the cleanup
    ///   interval is zero
    pub fn validate(&self) -> TournamentResult<()> {
        if let Some(size) = self.sizes.iter().find(|s| !AUTO_START_SIZES.contains(s)) {
            return Err(TournamentError::Validation(format!(
                "auto-tournament size {size} is not one of {AUTO_START_SIZES:?}"
            )));
        }
        if self.cleanup_interval.is_zero() {
            return Err(TournamentError::Validation(
                "cleanup interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
