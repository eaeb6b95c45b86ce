//! Process-local store.

use super::{DocumentStore, StoreResult, Tournaments, Users};
use crate::users::models::UserRecord;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tournaments: RwLock<Tournaments>,
    users: RwLock<Users>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with user records
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            tournaments: RwLock::default(),
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_tournaments(&self) -> StoreResult<Tournaments> {
        Ok(self.tournaments.read().await.clone())
    }

    async fn save_tournaments(&self, tournaments: &Tournaments) -> StoreResult<()> {
        *self.tournaments.write().await = tournaments.clone();
        Ok(())
    }

    async fn load_users(&self) -> StoreResult<Users> {
        Ok(self.users.read().await.clone())
    }

    async fn save_users(&self, users: &Users) -> StoreResult<()> {
        *self.users.write().await = users.clone();
        Ok(())
    }

    async fn load_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn save_user(&self, user: &UserRecord) -> StoreResult<()> {
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}
