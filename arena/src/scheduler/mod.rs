//! Auto-tournament scheduler.

pub mod auto;
pub mod config;

pub use auto::{AutoTournamentScheduler, OpenTournament, SlotStatus};
pub use config::{DEFAULT_GAMES, DEFAULT_SIZES, SchedulerConfig};
