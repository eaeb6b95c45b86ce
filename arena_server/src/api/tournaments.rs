//! Tournament API handlers.
//!
//! Public endpoints for browsing tournaments, joining them, reporting match
//! results and playing refereed games.
//!
//! # Examples
//!
//! Register for a tournament:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/tournament_ab12/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"wallet_address": "0xA11CE"}'
//! ```
//!
//! Report a result:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/tournament_ab12/matches/r1m1/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"submitter": "0xA11CE", "score1": 3, "score2": 1}'
//! ```

use super::{
    AppState,
    error::{ApiError, ApiResult},
    request_id::RequestId,
};
use crate::metrics;
use arena::{
    bracket::{SubmissionOutcome, models::{Bracket, Match}},
    tournament::{
        GameId, MatchUpdate, Participant, Tournament, TournamentConfig, TournamentFilter,
        TournamentId, TournamentStatus,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub game_id: Option<GameId>,
    pub status: Option<TournamentStatus>,
    pub auto_generated: Option<bool>,
}

impl From<ListQuery> for TournamentFilter {
    fn from(query: ListQuery) -> Self {
        TournamentFilter {
            game_id: query.game_id,
            status: query.status,
            auto_generated: query.auto_generated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TournamentListItem {
    pub id: TournamentId,
    pub name: String,
    pub game_id: GameId,
    pub status: TournamentStatus,
    pub participant_count: usize,
    pub auto_start_threshold: Option<u32>,
    pub is_auto_generated: bool,
    pub created_at: DateTime<Utc>,
    pub winner: Option<Participant>,
}

impl From<Tournament> for TournamentListItem {
    fn from(t: Tournament) -> Self {
        Self {
            participant_count: t.participants.len(),
            id: t.id,
            name: t.name,
            game_id: t.game_id,
            status: t.status,
            auto_start_threshold: t.auto_start_threshold,
            is_auto_generated: t.is_auto_generated,
            created_at: t.created_at,
            winner: t.winner,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub game_id: GameId,
    pub name: String,
    pub description: Option<String>,
    pub auto_start_threshold: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub wallet_address: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub submitter: String,
    pub score1: u32,
    pub score2: u32,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub player: String,
    #[serde(rename = "move")]
    pub mv: serde_json::Value,
}

/// List tournaments, newest last.
///
/// Filters: `game_id`, `status` (`registration`, `started`, `finished`),
/// `auto_generated`.
pub async fn list_tournaments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<TournamentListItem>>> {
    let tournaments = state.manager.list_tournaments(&query.into()).await?;
    Ok(Json(tournaments.into_iter().map(Into::into).collect()))
}

/// Create a tournament in registration.
///
/// # Errors
///
/// - `400 Bad Request`: empty name, invalid auto-start size
/// - `404 Not Found`: unknown game
pub async fn create_tournament(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<Tournament>)> {
    let config = TournamentConfig {
        game_id: request.game_id,
        name: request.name,
        description: request.description,
        auto_start_threshold: request.auto_start_threshold,
    };
    let tournament = state.manager.create_tournament(config).await?;

    tracing::info!(
        request_id = %request_id.as_str(),
        tournament_id = %tournament.id,
        "Tournament created via API"
    );
    Ok((StatusCode::CREATED, Json(tournament)))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(state.manager.get_tournament(&tournament_id).await?))
}

/// Bracket of a started or finished tournament, `null` during registration.
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Option<Bracket>>> {
    Ok(Json(state.manager.get_bracket(&tournament_id).await?))
}

pub async fn get_participants(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<Participant>>> {
    Ok(Json(state.manager.get_participants(&tournament_id).await?))
}

/// Join a tournament in registration.
///
/// The wallet needs a user profile first (`POST /api/v1/users`). The
/// registration that reaches the auto-start threshold starts the tournament.
///
/// # Errors
///
/// - `400 Bad Request`: no user profile for the wallet
/// - `409 Conflict`: already registered, or tournament not in registration
pub async fn register(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<RegistrationRequest>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .manager
            .register(&tournament_id, &request.wallet_address)
            .await?,
    ))
}

pub async fn unregister(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<RegistrationRequest>,
) -> ApiResult<Json<Tournament>> {
    Ok(Json(
        state
            .manager
            .unregister(&tournament_id, &request.wallet_address)
            .await?,
    ))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, String)>,
) -> ApiResult<Json<Match>> {
    Ok(Json(state.manager.get_match(&tournament_id, &match_id).await?))
}

/// Report a match result as one of its participants.
///
/// The match completes when both participants report the same score.
///
/// # Errors
///
/// - `400 Bad Request`: equal scores
/// - `403 Forbidden`: submitter does not play in the match
/// - `409 Conflict`: already reported, match completed, tournament not started
pub async fn submit_result(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, String)>,
    Json(request): Json<SubmitResultRequest>,
) -> ApiResult<Json<MatchUpdate>> {
    let update = state
        .manager
        .submit_result(
            &tournament_id,
            &match_id,
            &request.submitter,
            request.score1,
            request.score2,
        )
        .await?;

    if update.outcome == Some(SubmissionOutcome::Conflict) {
        metrics::result_conflicts_total();
    }
    Ok(Json(update))
}

/// Play one move of a refereed game.
///
/// # Errors
///
/// - `400 Bad Request`: illegal move, or the game is not refereed
/// - `403 Forbidden`: player does not play in the match
/// - `409 Conflict`: not the player's turn, match completed
pub async fn play_move(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, String)>,
    Json(request): Json<MoveRequest>,
) -> ApiResult<Json<MatchUpdate>> {
    state
        .manager
        .play_move(&tournament_id, &match_id, &request.player, request.mv)
        .await
        .map(Json)
        .map_err(ApiError::from)
}
