//! # Arena
//!
//! Single-elimination tournament engine: participants register, a bracket is
//! seeded, matches are decided by mutual result reports or an operator, and
//! winners advance until one remains.
//!
//! ## Architecture
//!
//! - [`bracket`]: pure bracket logic (seeding with byes, the two-party result
//!   protocol, round advancement)
//! - [`tournament`]: the [`TournamentManager`] that runs every lifecycle
//!   operation as a locked read-modify-write against the store
//! - [`scheduler`]: keeps an open auto-tournament per game and size
//! - [`stats`] and [`users`]: user records and their win counters
//! - [`game`]: game catalog and pluggable move-by-move rules
//! - [`store`] and [`db`]: document store backends (memory, JSON files,
//!   PostgreSQL)
//!
//! ## Example
//!
//! ```
//! use arena::bracket::{BracketBuilder, bracket_size};
//! use arena::tournament::Participant;
//! use chrono::Utc;
//!
//! let players: Vec<Participant> = (0..5)
//!     .map(|i| Participant::new(&format!("p{i}"), &format!("0x{i}"), &format!("Player {i}"), Utc::now()))
//!     .collect();
//!
//! let bracket = BracketBuilder::new().build(&players, Utc::now()).unwrap();
//! assert_eq!(bracket.size, bracket_size(5));
//! assert_eq!(bracket.bye_participants.len(), 3);
//! ```

pub mod bracket;
pub mod db;
pub mod game;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod tournament;
pub mod users;

pub use scheduler::{AutoTournamentScheduler, SchedulerConfig};
pub use store::{DocumentStore, JsonFileStore, MemoryStore, StoreError};
pub use tournament::{
    TournamentConfig, TournamentError, TournamentEvent, TournamentManager, TournamentResult,
};
pub use users::UserDirectory;
