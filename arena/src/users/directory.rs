//! User directory backed by the user collection.

use super::models::{MAX_USERNAME_LEN, UserId, UserRecord, user_id};
use crate::{
    store::DocumentStore,
    tournament::errors::{TournamentError, TournamentResult},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registers users and serializes every read-modify-write of the user
/// collection
pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a user for `wallet_address`, or rename an existing one
    ///
    /// # Errors
    ///
    /// * `Validation` - empty wallet, empty or over-long username
    /// * `Conflict` - username taken by another wallet (case-insensitive)
    pub async fn register(&self, wallet_address: &str, username: &str) -> TournamentResult<UserRecord> {
        let wallet_address = wallet_address.trim();
        let username = username.trim();

        if wallet_address.is_empty() {
            return Err(TournamentError::Validation(
                "wallet address is required".to_string(),
            ));
        }
        if username.is_empty() {
            return Err(TournamentError::Validation("username is required".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(TournamentError::Validation(format!(
                "username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }

        let id = user_id(wallet_address);
        let _guard = self.write_lock.lock().await;
        let mut users = self.store.load_users().await?;

        let lowered = username.to_lowercase();
        if users
            .values()
            .any(|u| u.id != id && u.username.to_lowercase() == lowered)
        {
            return Err(TournamentError::Conflict(format!(
                "username '{username}' is already taken"
            )));
        }

        let now = Utc::now();
        let record = users
            .entry(id.clone())
            .and_modify(|u| {
                u.username = username.to_string();
                u.updated_at = now;
            })
            .or_insert_with(|| UserRecord::new(wallet_address, username, now))
            .clone();

        self.store.save_users(&users).await?;
        log::info!("Registered user {} as '{}'", record.id, record.username);

        Ok(record)
    }

    /// Look up a user by wallet address or id
    pub async fn find(&self, wallet_or_id: &str) -> TournamentResult<Option<UserRecord>> {
        Ok(self.store.load_user(&user_id(wallet_or_id)).await?)
    }

    /// # Errors
    ///
    /// * `NotFound` - no user for this wallet
    pub async fn get(&self, wallet_or_id: &str) -> TournamentResult<UserRecord> {
        self.find(wallet_or_id)
            .await?
            .ok_or_else(|| TournamentError::not_found("User", user_id(wallet_or_id)))
    }

    pub async fn list(&self) -> TournamentResult<Vec<UserRecord>> {
        Ok(self.store.load_users().await?.into_values().collect())
    }

    /// Apply `update` to every listed user in a single collection write
    ///
    /// Returns the ids that have no user record; those are skipped.
    pub(crate) async fn update_each<F>(&self, ids: &[UserId], mut update: F) -> TournamentResult<Vec<UserId>>
    where
        F: FnMut(&mut UserRecord),
    {
        let _guard = self.write_lock.lock().await;
        let mut users = self.store.load_users().await?;

        let mut missing = Vec::new();
        for id in ids {
            match users.get_mut(id) {
                Some(user) => update(user),
                None => missing.push(id.clone()),
            }
        }

        self.store.save_users(&users).await?;
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn directory() -> UserDirectory {
        UserDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let users = directory();
        let user = users.register("0xABC", "  alice ").await.unwrap();
        assert_eq!(user.id, "0xabc");
        assert_eq!(user.username, "alice");

        assert!(users.find("0xAbc").await.unwrap().is_some());
        assert!(matches!(
            users.get("0xdef").await,
            Err(TournamentError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_username_unique_case_insensitive() {
        let users = directory();
        users.register("0x1", "Alice").await.unwrap();

        let err = users.register("0x2", "ALICE").await.unwrap_err();
        assert!(matches!(err, TournamentError::Conflict(_)));

        // The owner may re-register under the same name
        let renamed = users.register("0x1", "alice").await.unwrap();
        assert_eq!(renamed.username, "alice");
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_username_length() {
        let users = directory();
        assert!(matches!(
            users.register("0x1", "   ").await,
            Err(TournamentError::Validation(_))
        ));
        assert!(matches!(
            users.register("0x1", &"x".repeat(MAX_USERNAME_LEN + 1)).await,
            Err(TournamentError::Validation(_))
        ));
        assert!(users.register("0x1", &"x".repeat(MAX_USERNAME_LEN)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_each_reports_missing() {
        let users = directory();
        users.register("0x1", "alice").await.unwrap();

        let missing = users
            .update_each(&["0x1".to_string(), "0x2".to_string()], |u| {
                u.record_tournament("chess", true, Utc::now())
            })
            .await
            .unwrap();

        assert_eq!(missing, vec!["0x2".to_string()]);
        assert_eq!(users.get("0x1").await.unwrap().stats.total_wins, 1);
    }
}
