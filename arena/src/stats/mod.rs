//! Statistics propagation on tournament completion.

use crate::{
    tournament::{
        errors::{TournamentError, TournamentResult},
        models::{Tournament, TournamentStatus},
    },
    users::{UserDirectory, UserId},
};
use chrono::Utc;
use std::sync::Arc;

/// Applies win and participation counters to user records
pub struct StatsUpdater {
    users: Arc<UserDirectory>,
}

impl StatsUpdater {
    pub fn new(users: Arc<UserDirectory>) -> Self {
        Self { users }
    }

    /// Count a finished tournament for every participant
    ///
    /// Every participant gets `tournaments_played` incremented for the
    /// tournament's game; the winner additionally gets `wins` and
    /// `total_wins`. All updates land in a single write of the user
    /// collection. Participants without a user record are skipped.
    ///
    /// Call exactly once per completion.
    ///
    /// # Errors
    ///
    /// * `InvalidState` - tournament is not finished or has no winner
    /// * `Store` - the user collection could not be read or written; no
    ///   counter was applied
    pub async fn record_completion(&self, tournament: &Tournament) -> TournamentResult<()> {
        let (winner_id, ids) = counted(tournament)?;
        let now = Utc::now();
        let missing = self
            .users
            .update_each(&ids, |user| {
                let won = user.id == winner_id;
                user.record_tournament(&tournament.game_id, won, now);
            })
            .await?;

        for id in missing {
            log::warn!(
                "Skipping stats for {id} in tournament {}: no user record",
                tournament.id
            );
        }

        log::info!(
            "Recorded {} result for tournament {} (winner {winner_id})",
            tournament.game_id,
            tournament.id
        );
        Ok(())
    }

    /// Take back a `record_completion` whose tournament was never persisted
    /// as finished
    pub async fn revert_completion(&self, tournament: &Tournament) -> TournamentResult<()> {
        let (winner_id, ids) = counted(tournament)?;
        let now = Utc::now();
        self.users
            .update_each(&ids, |user| {
                let won = user.id == winner_id;
                user.revert_tournament(&tournament.game_id, won, now);
            })
            .await?;

        log::warn!("Reverted stats for tournament {}", tournament.id);
        Ok(())
    }
}

/// Winner id and every user id counted for a finished tournament
fn counted(tournament: &Tournament) -> TournamentResult<(UserId, Vec<UserId>)> {
    let winner_id = match (&tournament.status, &tournament.winner) {
        (TournamentStatus::Finished, Some(winner)) => winner.id.clone(),
        _ => {
            return Err(TournamentError::InvalidState(format!(
                "tournament {} has not finished",
                tournament.id
            )));
        }
    };

    let mut ids: Vec<UserId> = tournament.participants.iter().map(|p| p.id.clone()).collect();
    if !ids.contains(&winner_id) {
        ids.push(winner_id.clone());
    }
    Ok((winner_id, ids))
}
