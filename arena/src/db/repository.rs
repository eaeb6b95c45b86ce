//! PostgreSQL document store.
//!
//! Each collection is one JSONB row in a `documents` table. Whole-document
//! reads and writes map to single-row selects and upserts; single-user writes
//! merge into the user document in one statement.

use super::timeouts::{LONG_OPERATION_TIMEOUT, with_default_timeout, with_timeout};
use crate::{
    store::{DocumentStore, StoreError, StoreResult, Tournaments, Users},
    users::models::UserRecord,
};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{PgPool, Row};

/// Row name of the tournament collection
pub const TOURNAMENTS_DOCUMENT: &str = "tournaments";

/// Row name of the user collection
pub const USERS_DOCUMENT: &str = "users";

const CREATE_DOCUMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        name TEXT PRIMARY KEY,
        body JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Document store over a PostgreSQL pool
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `documents` table if it does not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        with_timeout(
            LONG_OPERATION_TIMEOUT,
            sqlx::query(CREATE_DOCUMENTS_TABLE).execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn read_document<T: DeserializeOwned + Default>(&self, name: &str) -> StoreResult<T> {
        let row = with_default_timeout(
            sqlx::query("SELECT body FROM documents WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => {
                let body: serde_json::Value = row.try_get("body")?;
                serde_json::from_value(body)
                    .map_err(|e| StoreError::Corrupt(format!("document {name}: {e}")))
            }
            None => Ok(T::default()),
        }
    }

    async fn write_document<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> StoreResult<()> {
        let body = serde_json::to_value(value)?;
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO documents (name, body, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (name) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
                "#,
            )
            .bind(name)
            .bind(body)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load_tournaments(&self) -> StoreResult<Tournaments> {
        self.read_document(TOURNAMENTS_DOCUMENT).await
    }

    async fn save_tournaments(&self, tournaments: &Tournaments) -> StoreResult<()> {
        self.write_document(TOURNAMENTS_DOCUMENT, tournaments).await
    }

    async fn load_users(&self) -> StoreResult<Users> {
        self.read_document(USERS_DOCUMENT).await
    }

    async fn save_users(&self, users: &Users) -> StoreResult<()> {
        self.write_document(USERS_DOCUMENT, users).await
    }

    async fn load_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        let row = with_default_timeout(
            sqlx::query("SELECT body -> $2 AS user_body FROM documents WHERE name = $1")
                .bind(USERS_DOCUMENT)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: Option<serde_json::Value> = row.try_get("user_body")?;
        body.map(|body| {
            serde_json::from_value(body)
                .map_err(|e| StoreError::Corrupt(format!("user {id}: {e}")))
        })
        .transpose()
    }

    async fn save_user(&self, user: &UserRecord) -> StoreResult<()> {
        let body = serde_json::to_value(user)?;
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO documents (name, body, updated_at)
                VALUES ($1, jsonb_build_object($2::text, $3::jsonb), NOW())
                ON CONFLICT (name) DO UPDATE
                    SET body = documents.body || EXCLUDED.body, updated_at = NOW()
                "#,
            )
            .bind(USERS_DOCUMENT)
            .bind(&user.id)
            .bind(body)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};
    use chrono::Utc;

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
    async fn test_documents_roundtrip() {
        let config = DatabaseConfig::from_env().unwrap_or_default();
        let db = Database::new(&config).await.expect("connect");
        let store = PgDocumentStore::new(db.pool().clone());
        store.ensure_schema().await.unwrap();

        let user = UserRecord::new("0xPgTest", "pg-tester", Utc::now());
        store.save_user(&user).await.unwrap();
        let loaded = store.load_user(&user.id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "pg-tester");

        let users = store.load_users().await.unwrap();
        assert!(users.contains_key(&user.id));
        db.close().await;
    }
}
