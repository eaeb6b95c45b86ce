//! Users: wallet-keyed records carrying cumulative tournament statistics.

pub mod directory;
pub mod models;

pub use directory::UserDirectory;
pub use models::{GameStats, MAX_USERNAME_LEN, UserId, UserRecord, UserStats, user_id};
