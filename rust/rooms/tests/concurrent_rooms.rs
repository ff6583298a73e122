/// Concurrent wagers and room independence
mod common;

use baccarat_engine::rules::BetChoice;
use baccarat_rooms::messages::ROUND_ABORTED;
use baccarat_rooms::{CancelReason, CloseReport, RoomEvent, RoundStatus, WagerError, WagerStatus};
use common::{config, events_until_close, table, table_with_resolver, CountingResolver};
use std::collections::HashSet;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_participants_each_get_one_entry() {
    const BETTORS: usize = 64;
    let names: Vec<String> = (0..BETTORS).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let t = table(config(60), &refs);

    let mut tasks = JoinSet::new();
    for name in names.clone() {
        let scheduler = t.scheduler.clone();
        tasks.spawn(async move {
            scheduler
                .place_wager("crowded", &name, &name, BetChoice::Player, 100)
                .await
        });
    }

    let mut receipts = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        receipts.push(joined.expect("task").expect("wager admitted"));
    }

    assert_eq!(receipts.len(), BETTORS);
    let round_ids: HashSet<_> = receipts.iter().map(|r| r.round_id.clone()).collect();
    assert_eq!(round_ids.len(), 1);
    let opened = receipts
        .iter()
        .filter(|r| r.status == WagerStatus::NewRound)
        .count();
    assert_eq!(opened, 1);
    assert!(receipts.iter().all(|r| r.status != WagerStatus::Updated));

    let wagers = t.scheduler.wagers("crowded");
    assert_eq!(wagers.len(), BETTORS);
    let distinct: HashSet<_> = wagers.iter().map(|w| w.participant.clone()).collect();
    assert_eq!(distinct.len(), BETTORS);

    t.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_wager_during_settlement_is_told_to_wait() {
    let t = table(config(60), &["a", "b"]);
    t.scheduler
        .place_wager("room", "a", "Alice", BetChoice::Banker, 1000)
        .await
        .expect("open");

    let release = t.gateway.hold_settlements();
    let closer = {
        let scheduler = t.scheduler.clone();
        tokio::spawn(async move { scheduler.close_session("room").await })
    };
    while t.scheduler.round_status("room") != Some(RoundStatus::Resolving) {
        tokio::task::yield_now().await;
    }

    let err = t
        .scheduler
        .place_wager("room", "b", "Bob", BetChoice::Player, 500)
        .await
        .unwrap_err();
    assert_eq!(err, WagerError::RoundClosing("room".into()));

    release.notify_one();
    let report = closer.await.expect("closer task");
    match report {
        CloseReport::Settled { settled, .. } => {
            assert_eq!(settled.len(), 1);
            assert_eq!(settled[0].wager.participant, "a");
        }
        other => panic!("expected settlement, got {other:?}"),
    }
    assert_eq!(t.gateway.settle_calls(), 1);

    // the room is free again for the next round
    let next = t
        .scheduler
        .place_wager("room", "b", "Bob", BetChoice::Player, 500)
        .await
        .expect("next round");
    assert_eq!(next.status, WagerStatus::NewRound);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_balance_check_opens_no_round() {
    let t = table(config(60), &["a"]);
    let release = t.gateway.hold_checks();
    let pending = {
        let scheduler = t.scheduler.clone();
        tokio::spawn(async move {
            scheduler
                .place_wager("room", "a", "Alice", BetChoice::Banker, 1000)
                .await
        })
    };
    while t.gateway.check_calls() == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(t.scheduler.shutdown(), 0);
    release.notify_one();

    let err = pending.await.expect("wager task").unwrap_err();
    assert_eq!(err, WagerError::ShuttingDown);
    assert!(t.scheduler.active_rooms().is_empty());

    tokio::time::sleep(std::time::Duration::from_secs(120)).await;
    assert_eq!(t.engine_calls(), 0);
    assert_eq!(t.gateway.settle_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rooms_close_independently() {
    let t = table(config(60), &["a", "b"]);
    t.scheduler
        .place_wager("north", "a", "Alice", BetChoice::Banker, 1000)
        .await
        .expect("north");
    t.scheduler
        .place_wager("south", "b", "Bob", BetChoice::Player, 1000)
        .await
        .expect("south");

    assert!(matches!(
        t.scheduler.close_session("north").await,
        CloseReport::Settled { .. }
    ));
    assert!(t.scheduler.is_round_open("south"));
    assert_eq!(t.scheduler.active_rooms(), vec!["south".to_string()]);
    assert_eq!(t.scheduler.close_session("north").await, CloseReport::NotOpen);
    assert_eq!(t.engine_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_engine_failure_aborts_only_that_room() {
    let t = table_with_resolver(config(60), &["a", "b"], |calls| {
        CountingResolver::new(7, calls).failing_first(1)
    });
    let mut north_events = t.notifier.subscribe("north");

    t.scheduler
        .place_wager("north", "a", "Alice", BetChoice::Banker, 1000)
        .await
        .expect("north");
    t.scheduler
        .place_wager("south", "b", "Bob", BetChoice::Player, 1000)
        .await
        .expect("south");

    match t.scheduler.close_session("north").await {
        CloseReport::Aborted { .. } => {}
        other => panic!("expected abort, got {other:?}"),
    }
    let events = events_until_close(&mut north_events).await;
    match events.last() {
        Some(RoomEvent::RoundCancelled { reason, text, .. }) => {
            assert_eq!(*reason, CancelReason::DealFailed);
            assert_eq!(text, ROUND_ABORTED);
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert_eq!(t.gateway.settle_calls(), 0);
    assert_eq!(t.gateway.ledger.balance("a"), Some(common::STARTING_BALANCE));
    assert!(!t.scheduler.active_rooms().contains(&"north".to_string()));

    assert!(matches!(
        t.scheduler.close_session("south").await,
        CloseReport::Settled { .. }
    ));
    assert_eq!(t.gateway.settle_calls(), 1);
    assert_eq!(t.engine_calls(), 2);
}
