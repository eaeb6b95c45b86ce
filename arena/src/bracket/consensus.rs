//! Match result protocol.
//!
//! A match is finalized either when both participants independently report the
//! same score, or when an operator decides it. Conflicting reports leave the
//! match pending until an operator steps in. Every function here validates
//! fully before touching the match, so an error never leaves it half-updated.

use super::models::{CompletedBy, Match, MatchStatus, PendingResult, Seat};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{Participant, ParticipantId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of reports a match holds
pub const MAX_PENDING_RESULTS: usize = 2;

/// What happened to a match after a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// First report recorded; the opponent has not reported yet
    WaitingForOpponent,
    /// Both reports disagree; an operator has to decide
    Conflict,
    /// Both reports agree; the match is completed
    Finalized { winner: ParticipantId },
}

/// Operator decision for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminDecision {
    /// Declare one of the two participants the winner
    Winner(ParticipantId),
    /// Record a score, the higher side wins
    Scores { score1: u32, score2: u32 },
}

fn ensure_decisive(score1: u32, score2: u32) -> TournamentResult<()> {
    if score1 == score2 {
        return Err(TournamentError::Validation(format!(
            "draws are not allowed ({score1}:{score2})"
        )));
    }
    Ok(())
}

fn ensure_pending(m: &Match) -> TournamentResult<()> {
    if m.status == MatchStatus::Completed {
        return Err(TournamentError::InvalidState(format!(
            "match {} is already completed",
            m.id
        )));
    }
    Ok(())
}

fn seat_for_scores(score1: u32, score2: u32) -> Seat {
    if score1 > score2 {
        Seat::Player1
    } else {
        Seat::Player2
    }
}

/// Complete a match in favour of `seat`
pub(crate) fn finalize(
    m: &mut Match,
    seat: Seat,
    scores: Option<(u32, u32)>,
    completed_by: CompletedBy,
    now: DateTime<Utc>,
) -> Participant {
    let winner = m.player(seat).clone();
    m.status = MatchStatus::Completed;
    m.winner = Some(winner.clone());
    m.score1 = scores.map(|(s1, _)| s1);
    m.score2 = scores.map(|(_, s2)| s2);
    m.completed_by = Some(completed_by);
    m.completed_at = Some(now);
    winner
}

/// Record one participant's report
///
/// # Errors
///
/// * `Validation` - equal scores
/// * `InvalidState` - match already completed
/// * `Forbidden` - submitter does not play in this match
/// * `Conflict` - submitter already reported
pub fn submit_result(
    m: &mut Match,
    submitter_id: &str,
    score1: u32,
    score2: u32,
    now: DateTime<Utc>,
) -> TournamentResult<SubmissionOutcome> {
    ensure_decisive(score1, score2)?;
    ensure_pending(m)?;

    if !m.involves(submitter_id) {
        return Err(TournamentError::Forbidden(format!(
            "{submitter_id} is not a participant of match {}",
            m.id
        )));
    }

    if m
        .pending_results
        .iter()
        .any(|r| r.submitter_id == submitter_id)
    {
        return Err(TournamentError::Conflict(format!(
            "{submitter_id} already submitted a result for match {}",
            m.id
        )));
    }

    if m.pending_results.len() >= MAX_PENDING_RESULTS {
        return Err(TournamentError::InvalidState(format!(
            "match {} already holds {MAX_PENDING_RESULTS} results",
            m.id
        )));
    }

    m.pending_results.push(PendingResult {
        submitter_id: submitter_id.to_string(),
        score1,
        score2,
        submitted_at: now,
        conflict: false,
    });

    if m.pending_results.len() < MAX_PENDING_RESULTS {
        return Ok(SubmissionOutcome::WaitingForOpponent);
    }

    if m.pending_results[0].same_scores(&m.pending_results[1]) {
        let winner = finalize(
            m,
            seat_for_scores(score1, score2),
            Some((score1, score2)),
            CompletedBy::Consensus,
            now,
        );
        Ok(SubmissionOutcome::Finalized { winner: winner.id })
    } else {
        for result in &mut m.pending_results {
            result.conflict = true;
        }
        Ok(SubmissionOutcome::Conflict)
    }
}

/// Apply an operator decision to a pending match
///
/// Clears any pending reports, including conflicting ones.
///
/// # Errors
///
/// * `InvalidState` - match already completed
/// * `Validation` - winner is not in the match, or the scores are tied
pub fn admin_set_result(
    m: &mut Match,
    decision: &AdminDecision,
    now: DateTime<Utc>,
) -> TournamentResult<Participant> {
    ensure_pending(m)?;

    let (seat, scores) = match decision {
        AdminDecision::Winner(winner_id) => {
            let seat = m.seat_of(winner_id).ok_or_else(|| {
                TournamentError::Validation(format!(
                    "{winner_id} is not a participant of match {}",
                    m.id
                ))
            })?;
            (seat, None)
        }
        AdminDecision::Scores { score1, score2 } => {
            ensure_decisive(*score1, *score2)?;
            (seat_for_scores(*score1, *score2), Some((*score1, *score2)))
        }
    };

    m.pending_results.clear();
    Ok(finalize(m, seat, scores, CompletedBy::Admin, now))
}

/// Revert a completed match to pending
///
/// # Errors
///
/// * `InvalidState` - match is not completed
pub fn reset_match(m: &mut Match) -> TournamentResult<()> {
    if m.status != MatchStatus::Completed {
        return Err(TournamentError::InvalidState(format!(
            "match {} is not completed",
            m.id
        )));
    }

    m.status = MatchStatus::Pending;
    m.winner = None;
    m.score1 = None;
    m.score2 = None;
    m.completed_by = None;
    m.completed_at = None;
    m.pending_results.clear();
    m.game_state = None;
    Ok(())
}
