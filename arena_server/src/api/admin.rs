//! Operator endpoints.
//!
//! All routes here sit behind [`admin_auth_middleware`](super::middleware::admin_auth_middleware).

use super::{AppState, error::ApiResult};
use crate::metrics;
use arena::{
    bracket::AdminDecision,
    scheduler::SlotStatus,
    tournament::{EngineOverview, MatchUpdate, Tournament, TournamentExport, TournamentId},
};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ForceCompleteRequest {
    pub winner: String,
}

#[derive(Debug, Serialize)]
pub struct EnsureResponse {
    pub created: Vec<TournamentId>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: Vec<TournamentId>,
}

/// Full snapshot of a tournament: info, participants, bracket and winner.
pub async fn export_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<TournamentExport>> {
    Ok(Json(state.manager.export_tournament(&tournament_id).await?))
}

pub async fn start_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(state.manager.start_tournament(&tournament_id).await?))
}

/// Decide a match regardless of reports.
///
/// Body is either `{"winner": "<participant id>"}` or
/// `{"scores": {"score1": 2, "score2": 0}}`.
pub async fn set_result(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, String)>,
    Json(decision): Json<AdminDecision>,
) -> ApiResult<Json<MatchUpdate>> {
    let update = state
        .manager
        .admin_set_result(&tournament_id, &match_id, decision)
        .await?;
    tracing::warn!(
        tournament_id = %tournament_id,
        match_id = %match_id,
        "Match result set by admin"
    );
    Ok(Json(update))
}

/// Return a completed match to pending; reopens a finished tournament.
pub async fn reset_match(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, String)>,
) -> ApiResult<Json<MatchUpdate>> {
    Ok(Json(
        state
            .manager
            .admin_reset_match(&tournament_id, &match_id)
            .await?,
    ))
}

pub async fn force_complete(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<ForceCompleteRequest>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .manager
            .force_complete(&tournament_id, &request.winner)
            .await?,
    ))
}

pub async fn cancel_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(state.manager.cancel_tournament(&tournament_id).await?))
}

/// Clear the participants of a tournament still in registration.
pub async fn reset_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(state.manager.reset_tournament(&tournament_id).await?))
}

pub async fn overview(State(state): State<AppState>) -> ApiResult<Json<EngineOverview>> {
    Ok(Json(state.manager.overview().await?))
}

pub async fn auto_tournament_status(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SlotStatus>>> {
    let slots = state.scheduler.status().await?;
    metrics::open_auto_slots(slots.iter().filter(|s| s.open.is_some()).count());
    Ok(Json(slots))
}

/// Open the missing auto-tournaments now.
pub async fn ensure_auto_tournaments(
    State(state): State<AppState>,
) -> ApiResult<Json<EnsureResponse>> {
    let created = state.scheduler.ensure().await?;
    Ok(Json(EnsureResponse {
        created: created.into_iter().map(|t| t.id).collect(),
    }))
}

/// Purge finished auto-tournaments past the retention window now.
pub async fn cleanup_auto_tournaments(
    State(state): State<AppState>,
) -> ApiResult<Json<CleanupResponse>> {
    let removed = state.scheduler.cleanup().await?;
    metrics::auto_tournaments_removed(removed.len());
    Ok(Json(CleanupResponse { removed }))
}
