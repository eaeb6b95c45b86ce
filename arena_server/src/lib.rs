//! HTTP server and scheduler host for the tournament engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
