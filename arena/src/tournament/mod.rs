//! Tournament lifecycle: registration, bracket start, match results and
//! completion.
//!
//! ## Example
//!
//! ```no_run
//! use arena::{
//!     store::{DocumentStore, MemoryStore},
//!     tournament::{TournamentConfig, TournamentManager},
//!     users::UserDirectory,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
//!     let users = Arc::new(UserDirectory::new(store.clone()));
//!     let manager = TournamentManager::new(store, users.clone());
//!
//!     let config = TournamentConfig::auto_start("chess", "Friday Blitz", 4);
//!     let tournament = manager.create_tournament(config).await?;
//!
//!     users.register("0xA11CE", "alice").await?;
//!     manager.register(&tournament.id, "0xA11CE").await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod events;
pub mod locks;
pub mod manager;
pub mod models;

pub use errors::{ErrorKind, TournamentError, TournamentResult};
pub use events::TournamentEvent;
pub use locks::TournamentLocks;
pub use manager::{MatchUpdate, TournamentFilter, TournamentManager, retention_cutoff};
pub use models::{
    AUTO_START_SIZES, EngineOverview, GameId, MAX_NAME_LEN, Participant, ParticipantId, Tournament,
    TournamentConfig, TournamentExport, TournamentId, TournamentInfo, TournamentStatus,
};
