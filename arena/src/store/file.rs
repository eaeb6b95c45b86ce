//! JSON documents in a data directory.
//!
//! Each collection lives in its own file. Writes go to a temporary sibling
//! first and are renamed into place, so readers never observe a torn document.

use super::{DocumentStore, StoreError, StoreResult, Tournaments, Users};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

/// Tournament collection file name
pub const TOURNAMENTS_FILE: &str = "tournaments.json";

/// User collection file name
pub const USERS_FILE: &str = "users.json";

/// File-backed document store
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory and empty
    /// documents when absent
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory or files cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        let store = Self {
            dir,
            write_lock: Mutex::new(()),
        };

        for name in [TOURNAMENTS_FILE, USERS_FILE] {
            let path = store.dir.join(name);
            if !fs::try_exists(&path).await? {
                log::info!("Creating empty document {}", path.display());
                store.write_document(name, &serde_json::Map::new()).await?;
            }
        }

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_document<T: DeserializeOwned + Default>(&self, name: &str) -> StoreResult<T> {
        let path = self.dir.join(name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
    }

    async fn write_document<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));

        let _guard = self.write_lock.lock().await;
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load_tournaments(&self) -> StoreResult<Tournaments> {
        self.read_document(TOURNAMENTS_FILE).await
    }

    async fn save_tournaments(&self, tournaments: &Tournaments) -> StoreResult<()> {
        self.write_document(TOURNAMENTS_FILE, tournaments).await
    }

    async fn load_users(&self) -> StoreResult<Users> {
        self.read_document(USERS_FILE).await
    }

    async fn save_users(&self, users: &Users) -> StoreResult<()> {
        self.write_document(USERS_FILE, users).await
    }
}
