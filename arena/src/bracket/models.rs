//! Bracket data models: matches, rounds and the bracket itself.

use crate::tournament::models::{Participant, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Match ID type, unique within a tournament
pub type MatchId = String;

/// Matches produced simultaneously
pub type Round = Vec<Match>;

/// Match lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Completed,
}

/// How a completed match got its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletedBy {
    /// Both participants reported identical scores
    Consensus,
    /// An operator decided the result
    Admin,
    /// Pluggable game rules detected a terminal position
    Gameplay,
}

/// Which side of a match a participant plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    pub fn opponent(self) -> Self {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }
}

/// One participant's reported result, scores from player1's perspective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResult {
    pub submitter_id: ParticipantId,
    pub score1: u32,
    pub score2: u32,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub conflict: bool,
}

impl PendingResult {
    pub fn same_scores(&self, other: &PendingResult) -> bool {
        self.score1 == other.score1 && self.score2 == other.score2
    }
}

/// A single pairing inside a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub player1: Participant,
    pub player2: Participant,
    pub status: MatchStatus,
    pub winner: Option<Participant>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    #[serde(default)]
    pub pending_results: Vec<PendingResult>,
    pub completed_by: Option<CompletedBy>,
    /// Opaque per-game state owned by the registered game rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create a fresh pending match
    pub fn new(id: MatchId, player1: Participant, player2: Participant, now: DateTime<Utc>) -> Self {
        Self {
            id,
            player1,
            player2,
            status: MatchStatus::Pending,
            winner: None,
            score1: None,
            score2: None,
            pending_results: Vec::new(),
            completed_by: None,
            game_state: None,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Seat of the given participant, if they play in this match
    pub fn seat_of(&self, participant_id: &str) -> Option<Seat> {
        if self.player1.id == participant_id {
            Some(Seat::Player1)
        } else if self.player2.id == participant_id {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    pub fn player(&self, seat: Seat) -> &Participant {
        match seat {
            Seat::Player1 => &self.player1,
            Seat::Player2 => &self.player2,
        }
    }

    pub fn involves(&self, participant_id: &str) -> bool {
        self.seat_of(participant_id).is_some()
    }
}

/// Single-elimination bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    /// Smallest power of two >= participant count
    pub size: u32,
    pub total_rounds: u32,
    /// Number of rounds materialized so far (1-based)
    pub current_round: u32,
    pub rounds: Vec<Round>,
    /// Participants sitting out round 0, consumed once round 0 completes
    pub bye_participants: Vec<Participant>,
    pub is_complete: bool,
    pub winner: Option<Participant>,
}

impl Bracket {
    /// Locate a match by id, returning its round index
    pub fn find_match(&self, match_id: &str) -> Option<(usize, &Match)> {
        self.rounds.iter().enumerate().find_map(|(round_index, round)| {
            round
                .iter()
                .find(|m| m.id == match_id)
                .map(|m| (round_index, m))
        })
    }

    pub fn find_match_mut(&mut self, match_id: &str) -> Option<(usize, &mut Match)> {
        self.rounds
            .iter_mut()
            .enumerate()
            .find_map(|(round_index, round)| {
                round
                    .iter_mut()
                    .find(|m| m.id == match_id)
                    .map(|m| (round_index, m))
            })
    }

    pub fn total_matches(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }

    pub fn completed_matches(&self) -> usize {
        self.rounds
            .iter()
            .flatten()
            .filter(|m| m.is_completed())
            .count()
    }

    /// Clear the completion markers set when the final winner was decided
    pub fn clear_completion(&mut self) {
        self.is_complete = false;
        self.winner = None;
    }
}

/// Deterministic match id for the n-th match (0-based) of a round (0-based)
pub(crate) fn match_id(round_index: usize, match_index: usize) -> MatchId {
    format!("r{}m{}", round_index + 1, match_index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str) -> Participant {
        Participant::new(id, &format!("0x{id}"), id, Utc::now())
    }

    #[test]
    fn test_seat_lookup() {
        let m = Match::new(
            match_id(0, 0),
            participant("alice"),
            participant("bob"),
            Utc::now(),
        );
        assert_eq!(m.id, "r1m1");
        assert_eq!(m.seat_of("alice"), Some(Seat::Player1));
        assert_eq!(m.seat_of("bob"), Some(Seat::Player2));
        assert_eq!(m.seat_of("carol"), None);
        assert_eq!(m.player(Seat::Player2).id, "bob");
        assert_eq!(Seat::Player1.opponent(), Seat::Player2);
    }

    #[test]
    fn test_find_match_reports_round_index() {
        let now = Utc::now();
        let bracket = Bracket {
            size: 4,
            total_rounds: 2,
            current_round: 2,
            rounds: vec![
                vec![
                    Match::new(match_id(0, 0), participant("a"), participant("b"), now),
                    Match::new(match_id(0, 1), participant("c"), participant("d"), now),
                ],
                vec![Match::new(match_id(1, 0), participant("a"), participant("c"), now)],
            ],
            bye_participants: Vec::new(),
            is_complete: false,
            winner: None,
        };

        let (round_index, found) = bracket.find_match("r2m1").expect("final exists");
        assert_eq!(round_index, 1);
        assert!(found.involves("c"));
        assert!(bracket.find_match("r3m1").is_none());
        assert_eq!(bracket.total_matches(), 3);
        assert_eq!(bracket.completed_matches(), 0);
    }
}
