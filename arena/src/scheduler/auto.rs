//! Keeps one open auto-tournament per configured game and size.

use super::config::SchedulerConfig;
use crate::tournament::{
    errors::TournamentResult,
    events::TournamentEvent,
    manager::{TournamentFilter, TournamentManager, retention_cutoff},
    models::{GameId, Tournament, TournamentId, TournamentStatus},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::{Mutex, broadcast::error::RecvError, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

/// Open auto-tournament of a configured slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTournament {
    pub id: TournamentId,
    pub name: String,
    pub participants: usize,
}

/// State of one configured (game, size) slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub game_id: GameId,
    pub size: u32,
    pub open: Option<OpenTournament>,
}

struct RunningTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Auto-tournament scheduler
///
/// Owned by the process and driven through [`start`](Self::start) and
/// [`stop`](Self::stop). While running it replaces completed auto-tournaments
/// and periodically purges old finished ones.
pub struct AutoTournamentScheduler {
    manager: Arc<TournamentManager>,
    config: SchedulerConfig,
    ensure_lock: Mutex<()>,
    task: Mutex<Option<RunningTask>>,
}

impl AutoTournamentScheduler {
    pub fn new(manager: Arc<TournamentManager>, config: SchedulerConfig) -> Self {
        Self {
            manager,
            config,
            ensure_lock: Mutex::new(()),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Create an open auto-tournament for every configured slot that lacks one
    ///
    /// Idempotent: slots that already have an open tournament are skipped.
    /// Returns the tournaments created.
    pub async fn ensure(&self) -> TournamentResult<Vec<Tournament>> {
        let mut created = Vec::new();
        for (game_id, size) in self.config.pairs() {
            if let Some(tournament) = self.ensure_pair(game_id, size).await? {
                created.push(tournament);
            }
        }
        Ok(created)
    }

    /// Create an open auto-tournament for one slot unless it already has one
    pub async fn ensure_pair(&self, game_id: &str, size: u32) -> TournamentResult<Option<Tournament>> {
        let _guard = self.ensure_lock.lock().await;
        if self.find_open(game_id, size).await?.is_some() {
            return Ok(None);
        }

        let tournament = self.manager.create_auto_tournament(game_id, size).await?;
        log::info!("Scheduler opened {} {size}P: {}", game_id, tournament.id);
        Ok(Some(tournament))
    }

    /// Delete finished auto-tournaments older than the retention window
    pub async fn cleanup(&self) -> TournamentResult<Vec<TournamentId>> {
        let removed = self
            .manager
            .purge_finished_auto(retention_cutoff(self.config.retention))
            .await?;
        if !removed.is_empty() {
            log::info!("Scheduler removed {} finished auto-tournaments", removed.len());
        }
        Ok(removed)
    }

    /// Report every configured slot
    pub async fn status(&self) -> TournamentResult<Vec<SlotStatus>> {
        let open = self.manager.list_tournaments(&open_auto_filter(None)).await?;

        Ok(self
            .config
            .pairs()
            .map(|(game_id, size)| SlotStatus {
                game_id: game_id.to_string(),
                size,
                open: open
                    .iter()
                    .find(|t| t.game_id == game_id && t.is_open_auto(size))
                    .map(|t| OpenTournament {
                        id: t.id.clone(),
                        name: t.name.clone(),
                        participants: t.participants.len(),
                    }),
            })
            .collect())
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Top up and clean once, then run in the background until stopped
    pub async fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            log::warn!("Auto-tournament scheduler already running");
            return;
        }

        // Subscribe before the first pass so no completion slips through
        let events = self.manager.subscribe();

        if let Err(e) = self.ensure().await {
            log::error!("Initial auto-tournament top-up failed: {e}");
        }
        if let Err(e) = self.cleanup().await {
            log::error!("Initial auto-tournament cleanup failed: {e}");
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.clone().run(events, shutdown_rx));
        *task = Some(RunningTask { handle, shutdown });

        log::info!(
            "Auto-tournament scheduler started ({} slots)",
            self.config.pairs().count()
        );
    }

    /// Stop the background task and wait for it to exit
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };

        let _ = task.shutdown.send(true);
        if let Err(e) = task.handle.await {
            log::error!("Auto-tournament scheduler task failed: {e}");
        }
        log::info!("Auto-tournament scheduler stopped");
    }

    async fn run(
        self: Arc<Self>,
        mut events: tokio::sync::broadcast::Receiver<TournamentEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(self.config.cleanup_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and start() already did that pass
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.cleanup().await {
                        log::error!("Auto-tournament cleanup failed: {e}");
                    }
                    if let Err(e) = self.ensure().await {
                        log::error!("Auto-tournament top-up failed: {e}");
                    }
                }
                event = events.recv() => match event {
                    Ok(TournamentEvent::Completed {
                        tournament_id,
                        game_id,
                        auto_size: Some(size),
                        ..
                    }) => {
                        log::info!("Auto-tournament {tournament_id} completed, scheduling replacement");
                        self.spawn_replacement(game_id, size, shutdown.clone());
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        log::warn!("Scheduler missed {missed} events, topping up");
                        if let Err(e) = self.ensure().await {
                            log::error!("Auto-tournament top-up failed: {e}");
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    /// Create the replacement after a delay, outside the completing
    /// tournament's critical section
    fn spawn_replacement(self: &Arc<Self>, game_id: GameId, size: u32, mut shutdown: watch::Receiver<bool>) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = tokio::time::sleep(this.config.replacement_delay) => {
                    if let Err(e) = this.ensure_pair(&game_id, size).await {
                        log::error!("Failed to replace {game_id} {size}P auto-tournament: {e}");
                    }
                }
            }
        });
    }

    async fn find_open(&self, game_id: &str, size: u32) -> TournamentResult<Option<Tournament>> {
        Ok(self
            .manager
            .list_tournaments(&open_auto_filter(Some(game_id)))
            .await?
            .into_iter()
            .find(|t| t.is_open_auto(size)))
    }
}

fn open_auto_filter(game_id: Option<&str>) -> TournamentFilter {
    TournamentFilter {
        game_id: game_id.map(str::to_string),
        status: Some(TournamentStatus::Registration),
        auto_generated: Some(true),
    }
}
