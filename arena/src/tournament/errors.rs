//! Tournament error types.

use crate::store::StoreError;
use thiserror::Error;

/// Coarse error category, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Validation,
    Conflict,
    Forbidden,
    IntegrityFault,
    Infrastructure,
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Tournament, match, game or user is unknown
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation not permitted in the current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Duplicate submission, registration or username
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is not a participant of the match
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bracket arithmetic violated an invariant
    #[error("Bracket integrity fault: {0}")]
    IntegrityFault(String),

    /// Store I/O failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::NotFound { .. } => ErrorKind::NotFound,
            TournamentError::InvalidState(_) => ErrorKind::InvalidState,
            TournamentError::Validation(_) => ErrorKind::Validation,
            TournamentError::Conflict(_) => ErrorKind::Conflict,
            TournamentError::Forbidden(_) => ErrorKind::Forbidden,
            TournamentError::IntegrityFault(_) => ErrorKind::IntegrityFault,
            TournamentError::Store(_) => ErrorKind::Infrastructure,
        }
    }

    /// Get a client-safe error message that doesn't leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(_) | TournamentError::IntegrityFault(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
