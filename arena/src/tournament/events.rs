//! Tournament lifecycle events.

use super::models::{GameId, Participant, TournamentId};
use crate::bracket::models::MatchId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging
pub const EVENT_CAPACITY: usize = 256;

/// Published after the corresponding change is committed to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentEvent {
    Started {
        tournament_id: TournamentId,
        participants: usize,
    },
    MatchFinalized {
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: Participant,
    },
    RoundCreated {
        tournament_id: TournamentId,
        round: u32,
        matches: usize,
    },
    Completed {
        tournament_id: TournamentId,
        game_id: GameId,
        /// Bracket size of an auto-generated tournament, `None` otherwise
        auto_size: Option<u32>,
        winner: Participant,
    },
    Deleted {
        tournament_id: TournamentId,
    },
}

impl TournamentEvent {
    pub fn tournament_id(&self) -> &str {
        match self {
            TournamentEvent::Started { tournament_id, .. }
            | TournamentEvent::MatchFinalized { tournament_id, .. }
            | TournamentEvent::RoundCreated { tournament_id, .. }
            | TournamentEvent::Completed { tournament_id, .. }
            | TournamentEvent::Deleted { tournament_id } => tournament_id,
        }
    }
}

/// Create the event channel
pub fn channel() -> broadcast::Sender<TournamentEvent> {
    broadcast::channel(EVENT_CAPACITY).0
}
