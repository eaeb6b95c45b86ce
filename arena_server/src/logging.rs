//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `init` installs a `tracing`
//! subscriber that also receives those records.

use arena::TournamentEvent;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use arena_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a tournament lifecycle event with structured fields
pub fn log_tournament_event(event: &TournamentEvent) {
    match event {
        TournamentEvent::Started {
            tournament_id,
            participants,
        } => tracing::info!(
            tournament_id = %tournament_id,
            participants = participants,
            "Tournament started"
        ),
        TournamentEvent::MatchFinalized {
            tournament_id,
            match_id,
            winner,
        } => tracing::info!(
            tournament_id = %tournament_id,
            match_id = %match_id,
            winner = %winner.id,
            "Match finalized"
        ),
        TournamentEvent::RoundCreated {
            tournament_id,
            round,
            matches,
        } => tracing::info!(
            tournament_id = %tournament_id,
            round = round,
            matches = matches,
            "Round created"
        ),
        TournamentEvent::Completed {
            tournament_id,
            game_id,
            auto_size,
            winner,
        } => tracing::info!(
            tournament_id = %tournament_id,
            game_id = %game_id,
            auto_size = ?auto_size,
            winner = %winner.id,
            "Tournament completed"
        ),
        TournamentEvent::Deleted { tournament_id } => {
            tracing::info!(tournament_id = %tournament_id, "Tournament deleted")
        }
    }
}

/// Log API request/response
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if status_code >= 500 {
        tracing::error!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena::tournament::Participant;
    use chrono::Utc;

    #[test]
    fn test_log_tournament_event() {
        // Just ensure it doesn't panic without a subscriber
        let winner = Participant::new("0xabc", "0xABC", "alice", Utc::now());
        log_tournament_event(&TournamentEvent::Completed {
            tournament_id: "t1".to_string(),
            game_id: "chess".to_string(),
            auto_size: Some(4),
            winner,
        });
        log_tournament_event(&TournamentEvent::Deleted {
            tournament_id: "t1".to_string(),
        });
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/v1/tournaments", 200, 45);
        log_api_request("POST", "/api/v1/tournaments", 500, 120);
    }
}
