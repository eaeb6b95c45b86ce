//! Tournament manager: the lifecycle operations exposed to callers.
//!
//! Every mutation of a tournament runs read-validate-mutate-commit while
//! holding that tournament's lock, so concurrent callers on the same
//! tournament never interleave. The commit itself re-reads the collection and
//! replaces only the one tournament, under a short collection-wide lock.
//! Statistics of a finishing tournament are written before its commit;
//! events are emitted only after a successful commit.

use super::{
    errors::{TournamentError, TournamentResult},
    events::{self, TournamentEvent},
    locks::TournamentLocks,
    models::{
        AUTO_START_SIZES, EngineOverview, GameId, MAX_NAME_LEN, Participant, Tournament,
        TournamentConfig, TournamentExport, TournamentId, TournamentStatus,
    },
};
use crate::{
    bracket::{
        Advancement, BracketBuilder, MIN_PARTICIPANTS, advance,
        consensus::{self, AdminDecision, SubmissionOutcome},
        models::{Bracket, CompletedBy, Match},
    },
    game::{GameCatalog, RulesRegistry, Terminal},
    stats::StatsUpdater,
    store::DocumentStore,
    users::{UserDirectory, user_id},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};
use uuid::Uuid;

/// Criteria for listing tournaments; `None` matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TournamentFilter {
    pub game_id: Option<GameId>,
    pub status: Option<TournamentStatus>,
    pub auto_generated: Option<bool>,
}

impl TournamentFilter {
    pub fn matches(&self, tournament: &Tournament) -> bool {
        self.game_id
            .as_ref()
            .is_none_or(|game_id| &tournament.game_id == game_id)
            && self.status.is_none_or(|status| tournament.status == status)
            && self
                .auto_generated
                .is_none_or(|auto| tournament.is_auto_generated == auto)
    }
}

/// State of a match after a result, override, reset or move
#[derive(Debug, Clone, Serialize)]
pub struct MatchUpdate {
    pub tournament_id: TournamentId,
    pub tournament_status: TournamentStatus,
    #[serde(rename = "match")]
    pub game_match: Match,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SubmissionOutcome>,
    /// Round number appended as a consequence of this update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_created: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champion: Option<Participant>,
}

/// Tournament manager
pub struct TournamentManager {
    store: Arc<dyn DocumentStore>,
    users: Arc<UserDirectory>,
    stats: StatsUpdater,
    catalog: GameCatalog,
    rules: RulesRegistry,
    locks: TournamentLocks,
    commit_lock: Mutex<()>,
    events: broadcast::Sender<TournamentEvent>,
}

impl TournamentManager {
    /// Create a manager over `store` with the default game catalog and the
    /// built-in game rules
    pub fn new(store: Arc<dyn DocumentStore>, users: Arc<UserDirectory>) -> Self {
        Self {
            store,
            stats: StatsUpdater::new(users.clone()),
            users,
            catalog: GameCatalog::default(),
            rules: RulesRegistry::with_builtin(),
            locks: TournamentLocks::new(),
            commit_lock: Mutex::new(()),
            events: events::channel(),
        }
    }

    pub fn with_catalog(mut self, catalog: GameCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_rules(mut self, rules: RulesRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    /// Subscribe to lifecycle events published after each commit
    pub fn subscribe(&self) -> broadcast::Receiver<TournamentEvent> {
        self.events.subscribe()
    }

    /// Create a tournament in registration
    ///
    /// # Errors
    ///
    /// * `Validation` - empty or over-long name, threshold outside the allowed sizes
    /// * `NotFound` - unknown game
    pub async fn create_tournament(&self, config: TournamentConfig) -> TournamentResult<Tournament> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(TournamentError::Validation("name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(TournamentError::Validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if !self.catalog.contains(&config.game_id) {
            return Err(TournamentError::not_found("Game", &config.game_id));
        }
        if let Some(threshold) = config.auto_start_threshold {
            validate_size(threshold)?;
        }

        let id = format!("tournament_{}", Uuid::new_v4().simple());
        let tournament = Tournament::new(id, config, Utc::now());
        self.commit(&tournament).await?;

        log::info!(
            "Created tournament {} '{}' for {}",
            tournament.id,
            tournament.name,
            tournament.game_id
        );
        Ok(tournament)
    }

    /// Create a system-owned tournament that starts at `size` participants
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown game
    /// * `Validation` - size outside the allowed sizes
    pub async fn create_auto_tournament(&self, game_id: &str, size: u32) -> TournamentResult<Tournament> {
        let game = self
            .catalog
            .get(game_id)
            .ok_or_else(|| TournamentError::not_found("Game", game_id))?;
        validate_size(size)?;

        let now = Utc::now();
        let name = format!("{} {size}P - {}", game.name, now.format("%d.%m.%Y %H:%M"));
        let mut config = TournamentConfig::auto_start(game_id, &name, size);
        config.description = Some(format!(
            "Automatic {size}-player {} tournament, starts when full",
            game.name
        ));

        let id = format!("auto_tournament_{game_id}_{size}p_{}", Uuid::new_v4().simple());
        let mut tournament = Tournament::new(id, config, now);
        tournament.is_auto_generated = true;
        self.commit(&tournament).await?;

        log::info!("Created auto-tournament {} '{}'", tournament.id, tournament.name);
        Ok(tournament)
    }

    /// Register a user for a tournament
    ///
    /// Reaching the auto-start threshold builds the bracket immediately.
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    /// * `InvalidState` - tournament is not in registration
    /// * `Validation` - no user record for `user_ref`
    /// * `Conflict` - already registered
    pub async fn register(&self, tournament_id: &str, user_ref: &str) -> TournamentResult<Tournament> {
        let _guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Registration)?;

        let user = self.users.find(user_ref).await?.ok_or_else(|| {
            TournamentError::Validation(format!(
                "{} has no user profile, register a username first",
                user_id(user_ref)
            ))
        })?;

        if tournament.is_registered(&user.id) {
            return Err(TournamentError::Conflict(format!(
                "{} is already registered for {}",
                user.id, tournament.id
            )));
        }

        let now = Utc::now();
        tournament.participants.push(Participant::new(
            &user.id,
            &user.wallet_address,
            &user.username,
            now,
        ));
        tournament.updated_at = now;

        let started = if tournament.should_auto_start() {
            let bracket = build_bracket(&tournament.participants, now)?;
            tournament.start(bracket, now);
            true
        } else {
            false
        };

        self.commit(&tournament).await?;
        log::info!(
            "{} registered for {} ({} participants)",
            user.id,
            tournament.id,
            tournament.participants.len()
        );

        if started {
            self.announce_start(&tournament);
        }
        Ok(tournament)
    }

    /// Withdraw a participant before the bracket is built
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    /// * `InvalidState` - tournament is not in registration
    /// * `Validation` - not registered
    pub async fn unregister(&self, tournament_id: &str, user_ref: &str) -> TournamentResult<Tournament> {
        let _guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Registration)?;

        let participant_id = user_id(user_ref);
        if !tournament.is_registered(&participant_id) {
            return Err(TournamentError::Validation(format!(
                "{participant_id} is not registered for {}",
                tournament.id
            )));
        }

        tournament.participants.retain(|p| p.id != participant_id);
        tournament.updated_at = Utc::now();
        self.commit(&tournament).await?;

        log::info!("{participant_id} left {}", tournament.id);
        Ok(tournament)
    }

    /// Build the bracket and start the tournament
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    /// * `InvalidState` - tournament is not in registration
    /// * `Validation` - fewer than two participants
    pub async fn start_tournament(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        let _guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Registration)?;

        if tournament.participants.len() < MIN_PARTICIPANTS {
            return Err(TournamentError::Validation(format!(
                "need at least {MIN_PARTICIPANTS} participants to start, have {}",
                tournament.participants.len()
            )));
        }

        let now = Utc::now();
        let bracket = build_bracket(&tournament.participants, now)?;
        tournament.start(bracket, now);
        self.commit(&tournament).await?;

        self.announce_start(&tournament);
        Ok(tournament)
    }

    /// Report a match result as one of its participants
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament or match
    /// * `InvalidState` - tournament not started, or match already completed
    /// * `Validation` - equal scores
    /// * `Forbidden` - submitter does not play in the match
    /// * `Conflict` - submitter already reported
    /// * `IntegrityFault` - advancement found an inconsistent bracket
    pub async fn submit_result(
        &self,
        tournament_id: &str,
        match_id: &str,
        submitter: &str,
        score1: u32,
        score2: u32,
    ) -> TournamentResult<MatchUpdate> {
        let guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Started)?;

        let now = Utc::now();
        let submitter_id = user_id(submitter);
        let (round_index, outcome) = {
            let (round_index, m) = find_match_mut(&mut tournament, match_id)?;
            let outcome = consensus::submit_result(m, &submitter_id, score1, score2, now)?;
            (round_index, outcome)
        };

        let advancement = match &outcome {
            SubmissionOutcome::Finalized { .. } => {
                Some(advance_tournament(&mut tournament, round_index, now)?)
            }
            SubmissionOutcome::Conflict => {
                log::warn!(
                    "Conflicting results for match {match_id} in {tournament_id}, waiting for admin"
                );
                None
            }
            SubmissionOutcome::WaitingForOpponent => None,
        };
        tournament.updated_at = now;

        self.commit_match(&tournament).await?;
        let update = self.finish_update(tournament, match_id, Some(outcome), advancement)?;
        self.release_if_finished(&update, guard).await;
        Ok(update)
    }

    /// Decide a pending match as an operator
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament or match
    /// * `InvalidState` - tournament not started, or match already completed
    /// * `Validation` - winner not in the match, or tied scores
    /// * `IntegrityFault` - advancement found an inconsistent bracket
    pub async fn admin_set_result(
        &self,
        tournament_id: &str,
        match_id: &str,
        decision: AdminDecision,
    ) -> TournamentResult<MatchUpdate> {
        let guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Started)?;

        let now = Utc::now();
        let decision = match decision {
            AdminDecision::Winner(id) => AdminDecision::Winner(user_id(&id)),
            scores => scores,
        };
        let round_index = {
            let (round_index, m) = find_match_mut(&mut tournament, match_id)?;
            consensus::admin_set_result(m, &decision, now)?;
            round_index
        };

        let advancement = advance_tournament(&mut tournament, round_index, now)?;
        tournament.updated_at = now;

        self.commit_match(&tournament).await?;
        log::info!("Admin decided match {match_id} in {tournament_id}");
        let update = self.finish_update(tournament, match_id, None, Some(advancement))?;
        self.release_if_finished(&update, guard).await;
        Ok(update)
    }

    /// Revert a completed match to pending
    ///
    /// A finished tournament returns to started. Later rounds are left
    /// untouched even when they already contain a participant of this match.
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament or match
    /// * `InvalidState` - tournament has no bracket, or match is not completed
    pub async fn admin_reset_match(&self, tournament_id: &str, match_id: &str) -> TournamentResult<MatchUpdate> {
        let _guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        if tournament.status == TournamentStatus::Registration {
            return Err(TournamentError::InvalidState(format!(
                "tournament {tournament_id} has not started"
            )));
        }

        let now = Utc::now();
        let (round_index, players) = {
            let (round_index, m) = find_match_mut(&mut tournament, match_id)?;
            consensus::reset_match(m)?;
            (round_index, [m.player1.id.clone(), m.player2.id.clone()])
        };

        if let Some(bracket) = &tournament.bracket
            && bracket.rounds[round_index + 1..]
                .iter()
                .flatten()
                .any(|m| players.iter().any(|p| m.involves(p)))
        {
            log::warn!(
                "Reset match {match_id} in {tournament_id}: later rounds already include {} or {}, not reconciled",
                players[0],
                players[1]
            );
        }

        if tournament.status == TournamentStatus::Finished {
            tournament.reopen(now);
            log::warn!("Tournament {tournament_id} reopened by reset of match {match_id}");
        } else {
            tournament.updated_at = now;
        }

        self.commit(&tournament).await?;
        self.finish_update(tournament, match_id, None, None)
    }

    /// Play one move of a refereed game
    ///
    /// A decisive terminal position completes the match exactly like an
    /// agreed result; a drawn position restarts the game.
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament or match
    /// * `InvalidState` - tournament not started, match completed, or not the player's turn
    /// * `Validation` - the game has no rules, or the move is illegal
    /// * `Forbidden` - player does not play in the match
    pub async fn play_move(
        &self,
        tournament_id: &str,
        match_id: &str,
        player: &str,
        mv: serde_json::Value,
    ) -> TournamentResult<MatchUpdate> {
        let guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Started)?;

        let rules = self.rules.get(&tournament.game_id).ok_or_else(|| {
            TournamentError::Validation(format!(
                "{} matches are not played through the engine",
                tournament.game_id
            ))
        })?;

        let now = Utc::now();
        let player_id = user_id(player);
        let (round_index, decided) = {
            let (round_index, m) = find_match_mut(&mut tournament, match_id)?;
            if m.is_completed() {
                return Err(TournamentError::InvalidState(format!(
                    "match {match_id} is already completed"
                )));
            }
            let seat = m.seat_of(&player_id).ok_or_else(|| {
                TournamentError::Forbidden(format!(
                    "{player_id} is not a participant of match {match_id}"
                ))
            })?;

            let state = match m.game_state.clone() {
                Some(state) => state,
                None => rules.new_state(now)?,
            };
            rules.validate_move(&state, seat, &mv)?;
            let state = rules.apply_move(state, seat, &mv, now)?;

            match rules.detect_terminal(&state)? {
                Some(Terminal::Winner(winner)) => {
                    m.game_state = Some(state);
                    m.pending_results.clear();
                    consensus::finalize(m, winner, None, CompletedBy::Gameplay, now);
                    (round_index, true)
                }
                Some(Terminal::Draw) => {
                    log::info!("Match {match_id} in {tournament_id} drawn, restarting");
                    m.game_state = Some(rules.new_state(now)?);
                    (round_index, false)
                }
                None => {
                    m.game_state = Some(state);
                    (round_index, false)
                }
            }
        };

        let advancement = if decided {
            Some(advance_tournament(&mut tournament, round_index, now)?)
        } else {
            None
        };
        tournament.updated_at = now;

        self.commit_match(&tournament).await?;
        let update = self.finish_update(tournament, match_id, None, advancement)?;
        self.release_if_finished(&update, guard).await;
        Ok(update)
    }

    /// Finish a started tournament with an explicit winner, bypassing the
    /// bracket
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    /// * `InvalidState` - tournament not started
    /// * `Validation` - winner is not a participant
    pub async fn force_complete(&self, tournament_id: &str, winner_ref: &str) -> TournamentResult<Tournament> {
        let guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Started)?;

        let winner = tournament
            .participant(&user_id(winner_ref))
            .cloned()
            .ok_or_else(|| {
                TournamentError::Validation(format!(
                    "{} is not a participant of {tournament_id}",
                    user_id(winner_ref)
                ))
            })?;

        tournament.finish(winner.clone(), Utc::now());
        self.commit_completion(&tournament).await?;

        log::warn!("Tournament {tournament_id} force-completed, winner {}", winner.id);
        self.announce_completion(&tournament, winner);
        self.locks.release(tournament_id, guard).await;
        Ok(tournament)
    }

    /// Cancel and delete a tournament that has not finished
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    /// * `InvalidState` - tournament already finished
    pub async fn cancel_tournament(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        let guard = self.locks.acquire(tournament_id).await;
        let tournament = self.load(tournament_id).await?;
        if tournament.status == TournamentStatus::Finished {
            return Err(TournamentError::InvalidState(format!(
                "finished tournament {tournament_id} cannot be cancelled"
            )));
        }

        self.remove(tournament_id).await?;
        drop(guard);
        self.locks.prune().await;

        log::info!("Cancelled tournament {tournament_id} '{}'", tournament.name);
        self.publish(TournamentEvent::Deleted {
            tournament_id: tournament.id.clone(),
        });
        Ok(tournament)
    }

    /// Clear participants of a tournament still in registration
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    /// * `InvalidState` - tournament is not in registration
    pub async fn reset_tournament(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        let _guard = self.locks.acquire(tournament_id).await;
        let mut tournament = self.load(tournament_id).await?;
        require_status(&tournament, TournamentStatus::Registration)?;

        tournament.participants.clear();
        tournament.bracket = None;
        tournament.winner = None;
        tournament.finished_at = None;
        tournament.updated_at = Utc::now();
        self.commit(&tournament).await?;

        log::info!("Reset tournament {tournament_id}");
        Ok(tournament)
    }

    /// Delete finished auto-generated tournaments that finished before `cutoff`
    ///
    /// Returns the deleted ids.
    pub async fn purge_finished_auto(&self, cutoff: DateTime<Utc>) -> TournamentResult<Vec<TournamentId>> {
        let candidates: Vec<TournamentId> = self
            .store
            .load_tournaments()
            .await?
            .into_values()
            .filter(|t| is_stale(t, cutoff))
            .map(|t| t.id)
            .collect();

        let mut removed = Vec::new();
        for id in candidates {
            let _guard = self.locks.acquire(&id).await;
            // Re-check under the lock, an admin reset may have reopened it
            match self.load(&id).await {
                Ok(t) if is_stale(&t, cutoff) => {
                    self.remove(&id).await?;
                    removed.push(id);
                }
                Ok(_) | Err(TournamentError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        self.locks.prune().await;
        for id in &removed {
            self.publish(TournamentEvent::Deleted {
                tournament_id: id.clone(),
            });
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    pub async fn get_tournament(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        self.load(tournament_id).await
    }

    /// Bracket of a started or finished tournament, `None` during registration
    pub async fn get_bracket(&self, tournament_id: &str) -> TournamentResult<Option<Bracket>> {
        Ok(self.load(tournament_id).await?.bracket)
    }

    pub async fn get_participants(&self, tournament_id: &str) -> TournamentResult<Vec<Participant>> {
        Ok(self.load(tournament_id).await?.participants)
    }

    /// # Errors
    ///
    /// * `NotFound` - unknown tournament, or no such match in its bracket
    pub async fn get_match(&self, tournament_id: &str, match_id: &str) -> TournamentResult<Match> {
        let tournament = self.load(tournament_id).await?;
        tournament
            .bracket
            .as_ref()
            .and_then(|b| b.find_match(match_id))
            .map(|(_, m)| m.clone())
            .ok_or_else(|| TournamentError::not_found("Match", match_id))
    }

    /// Tournaments matching `filter`, oldest first
    pub async fn list_tournaments(&self, filter: &TournamentFilter) -> TournamentResult<Vec<Tournament>> {
        let mut tournaments: Vec<Tournament> = self
            .store
            .load_tournaments()
            .await?
            .into_values()
            .filter(|t| filter.matches(t))
            .collect();
        tournaments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tournaments)
    }

    /// Counts across all tournaments and users
    pub async fn overview(&self) -> TournamentResult<EngineOverview> {
        let tournaments = self.store.load_tournaments().await?;
        let mut overview = EngineOverview::from_tournaments(tournaments.values());
        overview.total_users = self.store.load_users().await?.len();
        Ok(overview)
    }

    /// Snapshot a tournament for archiving
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown tournament
    pub async fn export_tournament(&self, tournament_id: &str) -> TournamentResult<TournamentExport> {
        let tournament = self.load(tournament_id).await?;
        log::info!("Exported tournament {tournament_id}");
        Ok(TournamentExport::new(tournament, Utc::now()))
    }

    async fn load(&self, tournament_id: &str) -> TournamentResult<Tournament> {
        self.store
            .load_tournaments()
            .await?
            .remove(tournament_id)
            .ok_or_else(|| TournamentError::not_found("Tournament", tournament_id))
    }

    /// Write one tournament back, leaving every other entry as currently stored
    async fn commit(&self, tournament: &Tournament) -> TournamentResult<()> {
        let _guard = self.commit_lock.lock().await;
        let mut tournaments = self.store.load_tournaments().await?;
        tournaments.insert(tournament.id.clone(), tournament.clone());
        self.store.save_tournaments(&tournaments).await?;
        Ok(())
    }

    /// Commit after a match mutation of a started tournament
    async fn commit_match(&self, tournament: &Tournament) -> TournamentResult<()> {
        if tournament.status == TournamentStatus::Finished {
            self.commit_completion(tournament).await
        } else {
            self.commit(tournament).await
        }
    }

    /// Count stats for a tournament that just finished, then commit it
    ///
    /// A failed stats write leaves the stored tournament untouched, so the
    /// deciding call can be repeated. A failed commit takes the stats back.
    async fn commit_completion(&self, tournament: &Tournament) -> TournamentResult<()> {
        self.stats
            .record_completion(tournament)
            .await
            .inspect_err(|e| {
                log::error!("Failed to record stats for tournament {}: {e}", tournament.id);
            })?;

        if let Err(e) = self.commit(tournament).await {
            if let Err(revert) = self.stats.revert_completion(tournament).await {
                log::error!(
                    "Stats for tournament {} counted without a stored completion: {revert}",
                    tournament.id
                );
            }
            return Err(e);
        }
        Ok(())
    }

    async fn release_if_finished(&self, update: &MatchUpdate, guard: OwnedMutexGuard<()>) {
        if update.tournament_status == TournamentStatus::Finished {
            self.locks.release(&update.tournament_id, guard).await;
        }
    }

    async fn remove(&self, tournament_id: &str) -> TournamentResult<()> {
        let _guard = self.commit_lock.lock().await;
        let mut tournaments = self.store.load_tournaments().await?;
        if tournaments.remove(tournament_id).is_some() {
            self.store.save_tournaments(&tournaments).await?;
        }
        Ok(())
    }

    fn publish(&self, event: TournamentEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn announce_start(&self, tournament: &Tournament) {
        log::info!(
            "Started tournament {} with {} participants",
            tournament.id,
            tournament.participants.len()
        );
        self.publish(TournamentEvent::Started {
            tournament_id: tournament.id.clone(),
            participants: tournament.participants.len(),
        });
    }

    fn announce_completion(&self, tournament: &Tournament, winner: Participant) {
        self.publish(TournamentEvent::Completed {
            tournament_id: tournament.id.clone(),
            game_id: tournament.game_id.clone(),
            auto_size: tournament
                .is_auto_generated
                .then_some(tournament.auto_start_threshold)
                .flatten(),
            winner,
        });
    }

    /// Post-commit bookkeeping shared by every match mutation
    fn finish_update(
        &self,
        tournament: Tournament,
        match_id: &str,
        outcome: Option<SubmissionOutcome>,
        advancement: Option<Advancement>,
    ) -> TournamentResult<MatchUpdate> {
        let game_match = tournament
            .bracket
            .as_ref()
            .and_then(|b| b.find_match(match_id))
            .map(|(_, m)| m.clone())
            .ok_or_else(|| TournamentError::not_found("Match", match_id))?;

        if let Some(winner) = game_match.winner.clone().filter(|_| advancement.is_some()) {
            self.publish(TournamentEvent::MatchFinalized {
                tournament_id: tournament.id.clone(),
                match_id: match_id.to_string(),
                winner,
            });
        }

        let mut update = MatchUpdate {
            tournament_id: tournament.id.clone(),
            tournament_status: tournament.status,
            game_match,
            outcome,
            round_created: None,
            champion: None,
        };

        match advancement {
            Some(Advancement::NextRound { round, matches }) => {
                log::info!("Tournament {}: round {round} created with {matches} matches", tournament.id);
                self.publish(TournamentEvent::RoundCreated {
                    tournament_id: tournament.id.clone(),
                    round,
                    matches,
                });
                update.round_created = Some(round);
            }
            Some(Advancement::Champion(champion)) => {
                log::info!("Tournament {} won by {}", tournament.id, champion.id);
                self.announce_completion(&tournament, champion.clone());
                update.champion = Some(champion);
            }
            Some(Advancement::RoundPending | Advancement::NoChange) | None => {}
        }

        Ok(update)
    }
}

fn validate_size(size: u32) -> TournamentResult<()> {
    if !AUTO_START_SIZES.contains(&size) {
        return Err(TournamentError::Validation(format!(
            "size must be one of {AUTO_START_SIZES:?}, got {size}"
        )));
    }
    Ok(())
}

fn require_status(tournament: &Tournament, expected: TournamentStatus) -> TournamentResult<()> {
    if tournament.status != expected {
        return Err(TournamentError::InvalidState(format!(
            "tournament {} is {:?}, expected {expected:?}",
            tournament.id, tournament.status
        )));
    }
    Ok(())
}

fn find_match_mut<'a>(tournament: &'a mut Tournament, match_id: &str) -> TournamentResult<(usize, &'a mut Match)> {
    tournament
        .bracket
        .as_mut()
        .ok_or_else(|| TournamentError::InvalidState("tournament has no bracket".to_string()))?
        .find_match_mut(match_id)
        .ok_or_else(|| TournamentError::not_found("Match", match_id))
}

fn build_bracket(participants: &[Participant], now: DateTime<Utc>) -> TournamentResult<Bracket> {
    BracketBuilder::new().build(participants, now)
}

/// Run round advancement and finish the tournament on a champion
fn advance_tournament(
    tournament: &mut Tournament,
    round_index: usize,
    now: DateTime<Utc>,
) -> TournamentResult<Advancement> {
    let bracket = tournament.bracket.as_mut().ok_or_else(|| {
        TournamentError::IntegrityFault(format!("started tournament {} has no bracket", tournament.id))
    })?;

    let advancement = advance(bracket, round_index, now).inspect_err(|e| {
        log::error!("Advancement aborted for tournament {}: {e}", tournament.id);
    })?;

    if let Advancement::Champion(champion) = &advancement {
        tournament.finish(champion.clone(), now);
    }
    Ok(advancement)
}

fn is_stale(tournament: &Tournament, cutoff: DateTime<Utc>) -> bool {
    tournament.is_auto_generated
        && tournament.status == TournamentStatus::Finished
        && tournament.finished_at.is_some_and(|at| at < cutoff)
}

/// Cutoff for a retention window ending now
pub fn retention_cutoff(retention: std::time::Duration) -> DateTime<Utc> {
    Duration::from_std(retention)
        .ok()
        .and_then(|retention| Utc::now().checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
