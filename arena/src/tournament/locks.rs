//! Per-tournament mutual exclusion.

use super::models::TournamentId;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock map keyed by tournament id
///
/// Holding the guard for a tournament serializes every read-modify-write of
/// that tournament. Different tournaments never contend.
#[derive(Debug, Default)]
pub struct TournamentLocks {
    locks: Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>,
}

impl TournamentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `tournament_id`
    pub async fn acquire(&self, tournament_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(tournament_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Give up `guard` and forget the lock for `tournament_id` unless another
    /// caller is waiting on it
    pub async fn release(&self, tournament_id: &str, guard: OwnedMutexGuard<()>) {
        let mut locks = self.locks.lock().await;
        drop(guard);
        if locks
            .get(tournament_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(tournament_id);
        }
    }

    /// Drop locks nobody holds or waits for
    pub async fn prune(&self) {
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
