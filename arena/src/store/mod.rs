//! Document store abstraction.
//!
//! The store persists two whole documents: the tournament collection and the
//! user collection. It offers no transactions or field-level updates; callers
//! serialize their own critical sections around these calls.

use crate::{
    tournament::models::{Tournament, TournamentId},
    users::models::{UserId, UserRecord},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Tournament collection, keyed by tournament id
pub type Tournaments = BTreeMap<TournamentId, Tournament>;

/// User collection, keyed by user id
pub type Users = BTreeMap<UserId, UserRecord>;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Document exists but does not have the expected shape
    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Whole-document store for tournaments and users
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the full tournament collection
    async fn load_tournaments(&self) -> StoreResult<Tournaments>;

    /// Replace the full tournament collection
    async fn save_tournaments(&self, tournaments: &Tournaments) -> StoreResult<()>;

    /// Read the full user collection
    async fn load_users(&self) -> StoreResult<Users>;

    /// Replace the full user collection
    async fn save_users(&self, users: &Users) -> StoreResult<()>;

    /// Read a single user record
    async fn load_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.load_users().await?.remove(id))
    }

    /// Insert or replace a single user record
    async fn save_user(&self, user: &UserRecord) -> StoreResult<()> {
        let mut users = self.load_users().await?;
        users.insert(user.id.clone(), user.clone());
        self.save_users(&users).await
    }
}
