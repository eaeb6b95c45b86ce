//! Prometheus metrics for monitoring tournament engine health.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts, duration, status codes
//! - **Tournament Metrics**: Lifecycle events by game
//! - **Scheduler Metrics**: Open auto-tournament slots, cleanups
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use arena_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/tournaments", 201);
//! ```

use arena::TournamentEvent;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Update counters for one lifecycle event.
pub fn record_event(event: &TournamentEvent) {
    match event {
        TournamentEvent::Started { participants, .. } => {
            metrics::counter!("tournaments_started_total").increment(1);
            metrics::histogram!("tournament_participants").record(*participants as f64);
        }
        TournamentEvent::MatchFinalized { .. } => {
            metrics::counter!("matches_finalized_total").increment(1);
        }
        TournamentEvent::RoundCreated { .. } => {
            metrics::counter!("rounds_created_total").increment(1);
        }
        TournamentEvent::Completed {
            game_id, auto_size, ..
        } => {
            metrics::counter!("tournaments_completed_total",
                "game" => game_id.clone(),
                "auto" => auto_size.is_some().to_string()
            )
            .increment(1);
        }
        TournamentEvent::Deleted { .. } => {
            metrics::counter!("tournaments_deleted_total").increment(1);
        }
    }
}

/// Increment result conflicts counter.
pub fn result_conflicts_total() {
    metrics::counter!("result_conflicts_total").increment(1);
}

// ============================================================================
// Scheduler Metrics
// ============================================================================

/// Set the number of configured slots that currently have an open tournament.
pub fn open_auto_slots(count: usize) {
    metrics::gauge!("open_auto_slots").set(count as f64);
}

/// Increment the cleanup counter by the number of removed tournaments.
pub fn auto_tournaments_removed(count: usize) {
    metrics::counter!("auto_tournaments_removed_total").increment(count as u64);
}
