//! HTTP API for the tournament engine.
//!
//! A thin JSON layer over [`TournamentManager`], [`UserDirectory`] and the
//! [`AutoTournamentScheduler`]. Handlers translate requests into engine
//! calls and engine errors into status codes; no tournament logic lives here.
//!
//! # Modules
//!
//! - [`tournaments`]: listing, creation, registration, result reports, moves
//! - [`users`]: user profiles and the game catalog
//! - [`admin`]: operator overrides, cancellation, engine statistics, scheduler
//! - [`middleware`]: admin bearer token check
//! - [`request_id`]: request correlation and request metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health
//! GET    /api/v1/games
//! POST   /api/v1/users
//! GET    /api/v1/users/{user_id}
//! GET    /api/v1/tournaments?game_id=&status=&auto_generated=
//! POST   /api/v1/tournaments
//! GET    /api/v1/tournaments/{id}
//! GET    /api/v1/tournaments/{id}/bracket
//! GET    /api/v1/tournaments/{id}/participants
//! POST   /api/v1/tournaments/{id}/register
//! POST   /api/v1/tournaments/{id}/unregister
//! GET    /api/v1/tournaments/{id}/matches/{match_id}
//! POST   /api/v1/tournaments/{id}/matches/{match_id}/result
//! POST   /api/v1/tournaments/{id}/matches/{match_id}/moves
//!
//! (admin, bearer token)
//! GET    /api/v1/admin/tournaments/{id}/export
//! POST   /api/v1/admin/tournaments/{id}/start
//! POST   /api/v1/admin/tournaments/{id}/matches/{match_id}/result
//! POST   /api/v1/admin/tournaments/{id}/matches/{match_id}/reset
//! POST   /api/v1/admin/tournaments/{id}/force-complete
//! POST   /api/v1/admin/tournaments/{id}/reset
//! DELETE /api/v1/admin/tournaments/{id}
//! GET    /api/v1/admin/overview
//! GET    /api/v1/admin/auto-tournaments
//! POST   /api/v1/admin/auto-tournaments/ensure
//! POST   /api/v1/admin/auto-tournaments/cleanup
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod admin;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod tournaments;
pub mod users;

use arena::{AutoTournamentScheduler, TournamentManager, UserDirectory};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    pub scheduler: Arc<AutoTournamentScheduler>,
    /// Expected admin bearer token; admin routes are open when `None`
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        manager: Arc<TournamentManager>,
        scheduler: Arc<AutoTournamentScheduler>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            manager,
            scheduler,
            admin_token: admin_token.map(Arc::from),
        }
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        self.manager.users()
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router(state.clone()))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/games", get(users::list_games))
        .route("/users", post(users::register_user))
        .route("/users/{user_id}", get(users::get_user))
        .route(
            "/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route("/tournaments/{tournament_id}/bracket", get(tournaments::get_bracket))
        .route(
            "/tournaments/{tournament_id}/participants",
            get(tournaments::get_participants),
        )
        .route("/tournaments/{tournament_id}/register", post(tournaments::register))
        .route("/tournaments/{tournament_id}/unregister", post(tournaments::unregister))
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}",
            get(tournaments::get_match),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/result",
            post(tournaments::submit_result),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/moves",
            post(tournaments::play_move),
        );

    let admin_routes = Router::new()
        .route("/tournaments/{tournament_id}", delete(admin::cancel_tournament))
        .route("/tournaments/{tournament_id}/export", get(admin::export_tournament))
        .route("/tournaments/{tournament_id}/start", post(admin::start_tournament))
        .route("/tournaments/{tournament_id}/reset", post(admin::reset_tournament))
        .route("/tournaments/{tournament_id}/force-complete", post(admin::force_complete))
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/result",
            post(admin::set_result),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/reset",
            post(admin::reset_match),
        )
        .route("/overview", get(admin::overview))
        .route("/auto-tournaments", get(admin::auto_tournament_status))
        .route("/auto-tournaments/ensure", post(admin::ensure_auto_tournaments))
        .route("/auto-tournaments/cleanup", post(admin::cleanup_auto_tournaments))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/admin", admin_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable`
/// otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.manager.overview().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: store unavailable");
            false
        }
    };
    let scheduler_running = state.scheduler.is_running().await;

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "scheduler_running": scheduler_running,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
