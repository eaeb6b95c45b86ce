//! Tournament data models for single-elimination tournaments.

use crate::bracket::models::Bracket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = String;

/// Participant ID type (the participant's user id)
pub type ParticipantId = String;

/// Game ID type
pub type GameId = String;

/// Bracket sizes a tournament may auto-start at
pub const AUTO_START_SIZES: [u32; 6] = [2, 4, 8, 16, 32, 64];

/// Maximum tournament name length
pub const MAX_NAME_LEN: usize = 100;

/// Tournament status. Only moves forward, except through explicit admin reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting registrations
    Registration,
    /// Bracket built, matches being played
    Started,
    /// A winner has been decided
    Finished,
}

/// A registered participant. Immutable once a bracket is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub wallet_address: String,
    pub display_name: String,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(id: &str, wallet_address: &str, display_name: &str, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            wallet_address: wallet_address.to_string(),
            display_name: display_name.to_string(),
            registered_at,
        }
    }
}

/// Tournament creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub game_id: GameId,
    pub name: String,
    pub description: Option<String>,
    /// Participant count at which the bracket is built automatically
    pub auto_start_threshold: Option<u32>,
}

impl TournamentConfig {
    /// Tournament that only starts on an explicit start call
    pub fn manual(game_id: &str, name: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            name: name.to_string(),
            description: None,
            auto_start_threshold: None,
        }
    }

    /// Tournament that starts as soon as `size` participants registered
    pub fn auto_start(game_id: &str, name: &str, size: u32) -> Self {
        Self {
            auto_start_threshold: Some(size),
            ..Self::manual(game_id, name)
        }
    }
}

/// Tournament document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub game_id: GameId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TournamentStatus,
    /// Unique by id, in registration order
    pub participants: Vec<Participant>,
    /// Present iff status is started or finished
    pub bracket: Option<Bracket>,
    pub auto_start_threshold: Option<u32>,
    #[serde(default)]
    pub is_auto_generated: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub winner: Option<Participant>,
}

impl Tournament {
    /// Create a tournament in registration
    pub fn new(id: TournamentId, config: TournamentConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            game_id: config.game_id,
            name: config.name.trim().to_string(),
            description: config
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            status: TournamentStatus::Registration,
            participants: Vec::new(),
            bracket: None,
            auto_start_threshold: config.auto_start_threshold,
            is_auto_generated: false,
            created_at: now,
            started_at: None,
            finished_at: None,
            updated_at: now,
            winner: None,
        }
    }

    pub fn is_registered(&self, participant_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == participant_id)
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    /// Whether the registration count reached the auto-start threshold
    pub fn should_auto_start(&self) -> bool {
        self.status == TournamentStatus::Registration
            && self
                .auto_start_threshold
                .is_some_and(|threshold| self.participants.len() >= threshold as usize)
    }

    /// Whether this is an open auto-tournament for the given size
    pub fn is_open_auto(&self, size: u32) -> bool {
        self.is_auto_generated
            && self.status == TournamentStatus::Registration
            && self.auto_start_threshold == Some(size)
    }

    /// Install a freshly built bracket and move to started
    pub(crate) fn start(&mut self, bracket: Bracket, now: DateTime<Utc>) {
        self.bracket = Some(bracket);
        self.status = TournamentStatus::Started;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Mark the tournament finished with the given winner
    pub(crate) fn finish(&mut self, winner: Participant, now: DateTime<Utc>) {
        if let Some(bracket) = self.bracket.as_mut() {
            bracket.is_complete = true;
            bracket.winner = Some(winner.clone());
        }
        self.winner = Some(winner);
        self.status = TournamentStatus::Finished;
        self.finished_at = Some(now);
        self.updated_at = now;
    }

    /// Undo `finish`, returning to started
    pub(crate) fn reopen(&mut self, now: DateTime<Utc>) {
        if let Some(bracket) = self.bracket.as_mut() {
            bracket.clear_completion();
        }
        self.winner = None;
        self.finished_at = None;
        self.status = TournamentStatus::Started;
        self.updated_at = now;
    }
}

/// Aggregate counts across all tournaments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOverview {
    pub total_tournaments: usize,
    pub registration: usize,
    pub started: usize,
    pub finished: usize,
    pub total_matches: usize,
    pub completed_matches: usize,
    pub total_users: usize,
}

impl EngineOverview {
    pub fn from_tournaments<'a>(tournaments: impl IntoIterator<Item = &'a Tournament>) -> Self {
        let mut overview = Self::default();
        for tournament in tournaments {
            overview.total_tournaments += 1;
            match tournament.status {
                TournamentStatus::Registration => overview.registration += 1,
                TournamentStatus::Started => overview.started += 1,
                TournamentStatus::Finished => overview.finished += 1,
            }
            if let Some(bracket) = &tournament.bracket {
                overview.total_matches += bracket.total_matches();
                overview.completed_matches += bracket.completed_matches();
            }
        }
        overview
    }
}

/// Descriptive part of a [`TournamentExport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub name: String,
    pub description: String,
    pub game_id: GameId,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Self-contained snapshot of one tournament for archiving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentExport {
    pub tournament_info: TournamentInfo,
    pub participants: Vec<Participant>,
    pub bracket: Option<Bracket>,
    pub winner: Option<Participant>,
    pub exported_at: DateTime<Utc>,
}

impl TournamentExport {
    pub fn new(tournament: Tournament, now: DateTime<Utc>) -> Self {
        Self {
            tournament_info: TournamentInfo {
                name: tournament.name,
                description: tournament.description,
                game_id: tournament.game_id,
                status: tournament.status,
                created_at: tournament.created_at,
                started_at: tournament.started_at,
                finished_at: tournament.finished_at,
            },
            participants: tournament.participants,
            bracket: tournament.bracket,
            winner: tournament.winner,
            exported_at: now,
        }
    }
}
