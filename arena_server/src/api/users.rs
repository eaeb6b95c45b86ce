//! User profile and game catalog handlers.

use super::{AppState, error::ApiResult};
use arena::{game::GameDefinition, users::UserRecord};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub wallet_address: String,
    pub username: String,
}

/// Create or rename the profile of a wallet.
///
/// # Errors
///
/// - `400 Bad Request`: empty wallet, username empty or longer than 50 characters
/// - `409 Conflict`: username taken by another wallet
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    let user = state
        .users()
        .register(&request.wallet_address, &request.username)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Profile and statistics of a user, by wallet address or user id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.users().get(&user_id).await?))
}

pub async fn list_games(State(state): State<AppState>) -> Json<Vec<GameDefinition>> {
    Json(state.manager.catalog().list().to_vec())
}
