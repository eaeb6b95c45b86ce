//! Integration tests for the auto-tournament scheduler

use arena::{
    bracket::AdminDecision,
    scheduler::{AutoTournamentScheduler, SchedulerConfig},
    store::{DocumentStore, MemoryStore},
    tournament::{TournamentConfig, TournamentManager, TournamentStatus},
    users::UserDirectory,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::{sync::Arc, time::Duration};

struct Harness {
    store: Arc<dyn DocumentStore>,
    manager: Arc<TournamentManager>,
    scheduler: Arc<AutoTournamentScheduler>,
}

async fn harness(games: &[&str], sizes: &[u32]) -> Harness {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let users = Arc::new(UserDirectory::new(store.clone()));
    for i in 0..4 {
        users
            .register(&format!("0xS{i}"), &format!("sched{i}"))
            .await
            .unwrap();
    }
    let manager = Arc::new(TournamentManager::new(store.clone(), users));
    let config = SchedulerConfig {
        games: games.iter().map(|g| g.to_string()).collect(),
        sizes: sizes.to_vec(),
        cleanup_interval: Duration::from_secs(3600),
        retention: Duration::from_secs(24 * 60 * 60),
        replacement_delay: Duration::from_millis(10),
    };
    let scheduler = Arc::new(AutoTournamentScheduler::new(manager.clone(), config));
    Harness {
        store,
        manager,
        scheduler,
    }
}

/// Fill and decide a 2-player auto-tournament
async fn play_out_pair(h: &Harness, tournament_id: &str) {
    h.manager.register(tournament_id, "0xS0").await.unwrap();
    let t = h.manager.register(tournament_id, "0xS1").await.unwrap();
    assert_eq!(t.status, TournamentStatus::Started);

    let m = t.bracket.unwrap().rounds[0][0].clone();
    let update = h
        .manager
        .admin_set_result(tournament_id, &m.id, AdminDecision::Winner(m.player1.id.clone()))
        .await
        .unwrap();
    assert_eq!(update.tournament_status, TournamentStatus::Finished);
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let h = harness(&["fifa", "chess"], &[2, 4]).await;

    let created = h.scheduler.ensure().await.unwrap();
    assert_eq!(created.len(), 4);
    assert!(created.iter().all(|t| t.is_auto_generated));
    assert!(created.iter().all(|t| t.status == TournamentStatus::Registration));

    let again = h.scheduler.ensure().await.unwrap();
    assert!(again.is_empty());

    let all = h.manager.list_tournaments(&Default::default()).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_concurrent_ensure_creates_one_per_slot() {
    let h = harness(&["cod"], &[2, 8]).await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = h.scheduler.clone();
            tokio::spawn(async move { scheduler.ensure().await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let all = h.manager.list_tournaments(&Default::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_manual_tournaments_do_not_fill_slots() {
    let h = harness(&["fifa"], &[2]).await;
    h.manager
        .create_tournament(TournamentConfig::auto_start("fifa", "Hand-made", 2))
        .await
        .unwrap();

    let created = h.scheduler.ensure().await.unwrap();
    assert_eq!(created.len(), 1);
}

#[tokio::test]
async fn test_status_reports_open_slots() {
    let h = harness(&["chess"], &[2, 4]).await;
    let before = h.scheduler.status().await.unwrap();
    assert_eq!(before.len(), 2);
    assert!(before.iter().all(|slot| slot.open.is_none()));

    h.scheduler.ensure().await.unwrap();
    let open = h.scheduler.status().await.unwrap();
    let four = open.iter().find(|slot| slot.size == 4).unwrap();
    let tournament = four.open.as_ref().unwrap();
    assert_eq!(tournament.participants, 0);

    h.manager.register(&tournament.id, "0xS2").await.unwrap();
    let after = h.scheduler.status().await.unwrap();
    let four = after.iter().find(|slot| slot.size == 4).unwrap();
    assert_eq!(four.open.as_ref().unwrap().participants, 1);
}

#[tokio::test]
async fn test_completed_auto_tournament_is_replaced() {
    let h = harness(&["fifa"], &[2]).await;
    h.scheduler.start().await;
    assert!(h.scheduler.is_running().await);

    let slot = h.scheduler.status().await.unwrap().remove(0);
    let first = slot.open.expect("start() tops up").id;

    play_out_pair(&h, &first).await;

    let mut replacement = None;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if let Some(open) = h.scheduler.status().await.unwrap().remove(0).open {
            replacement = Some(open.id);
            break;
        }
    }
    let replacement = replacement.expect("replacement created after completion");
    assert_ne!(replacement, first);

    h.scheduler.stop().await;
    assert!(!h.scheduler.is_running().await);

    let auto = h
        .manager
        .list_tournaments(&Default::default())
        .await
        .unwrap();
    assert_eq!(auto.len(), 2);
}

#[tokio::test]
async fn test_cleanup_respects_retention() {
    let h = harness(&["chess"], &[2]).await;
    let created = h.scheduler.ensure().await.unwrap();
    let old_id = created[0].id.clone();
    play_out_pair(&h, &old_id).await;

    // A finished manual tournament is never purged
    let manual = h
        .manager
        .create_tournament(TournamentConfig::manual("chess", "Keep me"))
        .await
        .unwrap();
    h.manager.register(&manual.id, "0xS2").await.unwrap();
    h.manager.register(&manual.id, "0xS3").await.unwrap();
    h.manager.start_tournament(&manual.id).await.unwrap();
    h.manager.force_complete(&manual.id, "0xS2").await.unwrap();

    // Nothing is old enough yet
    assert!(h.scheduler.cleanup().await.unwrap().is_empty());

    let mut tournaments = h.store.load_tournaments().await.unwrap();
    let long_ago = Utc::now() - ChronoDuration::hours(48);
    for t in tournaments.values_mut() {
        t.finished_at = t.finished_at.map(|_| long_ago);
    }
    h.store.save_tournaments(&tournaments).await.unwrap();

    let removed = h.scheduler.cleanup().await.unwrap();
    assert_eq!(removed, vec![old_id.clone()]);
    assert!(h.manager.get_tournament(&old_id).await.is_err());
    assert!(h.manager.get_tournament(&manual.id).await.is_ok());
}

#[tokio::test]
async fn test_cleanup_keeps_unfinished_auto_tournaments() {
    let h = harness(&["chess", "fifa", "cod"], &[2]).await;
    let created = h.scheduler.ensure().await.unwrap();
    let id_for = |game: &str| {
        created
            .iter()
            .find(|t| t.game_id == game)
            .map(|t| t.id.clone())
            .unwrap()
    };
    let (started_id, reopened_id, open_id) = (id_for("chess"), id_for("fifa"), id_for("cod"));

    h.manager.register(&started_id, "0xS0").await.unwrap();
    h.manager.register(&started_id, "0xS1").await.unwrap();

    // Finished, then put back in play by an admin reset
    h.manager.register(&reopened_id, "0xS2").await.unwrap();
    let t = h.manager.register(&reopened_id, "0xS3").await.unwrap();
    let m = t.bracket.unwrap().rounds[0][0].clone();
    h.manager
        .admin_set_result(&reopened_id, &m.id, AdminDecision::Winner(m.player1.id.clone()))
        .await
        .unwrap();
    let update = h.manager.admin_reset_match(&reopened_id, &m.id).await.unwrap();
    assert_eq!(update.tournament_status, TournamentStatus::Started);

    h.manager.register(&open_id, "0xS0").await.unwrap();

    // Age everything far past the retention window, finish stamps included
    let mut tournaments = h.store.load_tournaments().await.unwrap();
    let long_ago = Utc::now() - ChronoDuration::days(30);
    for t in tournaments.values_mut() {
        t.created_at = long_ago;
        t.updated_at = long_ago;
        t.finished_at = Some(long_ago);
    }
    h.store.save_tournaments(&tournaments).await.unwrap();

    assert!(h.manager.purge_finished_auto(Utc::now()).await.unwrap().is_empty());
    assert!(h.scheduler.cleanup().await.unwrap().is_empty());

    for (id, status) in [
        (&started_id, TournamentStatus::Started),
        (&reopened_id, TournamentStatus::Started),
        (&open_id, TournamentStatus::Registration),
    ] {
        assert_eq!(h.manager.get_tournament(id).await.unwrap().status, status);
    }
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let h = harness(&["fifa"], &[2]).await;
    h.scheduler.stop().await;
    assert!(!h.scheduler.is_running().await);
}
