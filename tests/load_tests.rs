// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ledger loading, derived views and session switches.

use fitrank::error::WorkflowError;
use fitrank::models::StatusKind;
use fitrank::services::workflow::MSG_LOAD_FAILED;
use fitrank::services::{LoadOutcome, WalletSession};
use std::time::Duration;

mod common;
use common::{address, harness, record_data, workout, ALICE, BOB};

#[tokio::test]
async fn test_unreadable_records_are_skipped() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, None), 1).await;
    h.contract.seed_record("fitness-2", record_data("b", ALICE, None), 2).await;
    h.contract.seed_record("fitness-3", record_data("c", BOB, None), 3).await;
    h.contract.seed_record("fitness-4", record_data("d", "not-an-address", None), 4).await;
    h.contract
        .configure(|f| {
            f.unreadable.insert("fitness-2".to_string());
        })
        .await;
    h.connect(ALICE).await;

    let outcome = h.coordinator.load_records().await.unwrap();

    assert_eq!(
        outcome,
        LoadOutcome {
            loaded: 2,
            skipped: 2,
            applied: true
        }
    );
    let ids: Vec<String> = h.coordinator.records().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["fitness-1", "fitness-3"]);
}

#[tokio::test]
async fn test_reload_replaces_ledger() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, None), 1).await;
    h.connect(ALICE).await;
    h.coordinator.load_records().await.unwrap();
    assert_eq!(h.coordinator.records().len(), 1);

    h.contract.seed_record("fitness-2", record_data("b", BOB, Some(7)), 7).await;
    h.coordinator.load_records().await.unwrap();

    assert_eq!(h.coordinator.records().len(), 2);
    assert!(!h.coordinator.snapshot().refreshing);
}

#[tokio::test]
async fn test_list_failure_keeps_ledger() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, None), 1).await;
    h.connect(ALICE).await;
    h.contract
        .configure(|f| f.list_ids = Some("gateway down".into()))
        .await;

    let err = h.coordinator.load_records().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Remote(_)));
    assert_eq!(h.coordinator.records().len(), 1);
    let status = h.coordinator.status();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.message, MSG_LOAD_FAILED);
}

#[tokio::test]
async fn test_load_requires_connection() {
    let h = harness();
    let err = h.coordinator.load_records().await.unwrap_err();
    assert_eq!(err, WorkflowError::NotConnected);
    assert_eq!(h.contract.list_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_load_from_previous_session_is_discarded() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, None), 1).await;
    h.connect(ALICE).await;
    h.contract
        .configure(|f| f.list_delay = Some(Duration::from_secs(5)))
        .await;

    let coordinator = h.coordinator.clone();
    let load = tokio::spawn(async move { coordinator.load_records().await });
    tokio::task::yield_now().await;

    h.coordinator.disconnect();
    let outcome = load.await.unwrap().unwrap();

    assert!(!outcome.applied);
    assert_eq!(outcome.loaded, 1);
    assert!(h.coordinator.records().is_empty());
    assert_eq!(h.coordinator.account(), None);
}

#[tokio::test(start_paused = true)]
async fn test_wallet_disconnect_applies_during_initial_load() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, None), 1).await;
    h.contract
        .configure(|f| f.list_delay = Some(Duration::from_millis(800)))
        .await;
    let wallet = WalletSession::new();
    let _follower = h.coordinator.clone().follow_wallet(wallet.subscribe());
    tokio::task::yield_now().await;

    wallet.connect(address(ALICE));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.coordinator.account(), Some(address(ALICE)));
    assert!(h.coordinator.snapshot().refreshing);

    wallet.disconnect();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.coordinator.account(), None);

    let err = h
        .coordinator
        .submit_workout(workout("Run", "100", "10", "50"))
        .await
        .unwrap_err();
    assert_eq!(err, WorkflowError::NotConnected);
    assert_eq!(h.contract.create_calls(), 0);

    // The slow load finishes under a dead epoch and is dropped.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!h.coordinator.snapshot().refreshing);
    assert!(h.coordinator.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wallet_switch_during_initial_load_keeps_new_account() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", BOB, Some(9000)), 9000).await;
    h.contract
        .configure(|f| f.list_delay = Some(Duration::from_millis(500)))
        .await;
    let wallet = WalletSession::new();
    let _follower = h.coordinator.clone().follow_wallet(wallet.subscribe());
    tokio::task::yield_now().await;

    wallet.connect(address(ALICE));
    tokio::time::sleep(Duration::from_millis(100)).await;
    wallet.connect(address(BOB));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.coordinator.account(), Some(address(BOB)));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.coordinator.records().len(), 1);
    assert_eq!(h.coordinator.stats().total_steps, 9000);
}

#[tokio::test]
async fn test_account_switch_recomputes_stats() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, Some(4000)), 4000).await;
    h.contract.seed_record("fitness-2", record_data("b", BOB, Some(9000)), 9000).await;
    h.contract.seed_record("fitness-3", record_data("c", BOB, None), 5).await;

    h.connect(ALICE).await;
    assert_eq!(h.coordinator.stats().total_steps, 4000);
    assert_eq!(h.coordinator.history().len(), 1);

    h.connect(BOB).await;
    let stats = h.coordinator.stats();
    assert_eq!(stats.total_steps, 9000);
    assert_eq!(stats.total_calories, 400);
    assert_eq!(h.coordinator.history().len(), 2);
    assert_eq!(h.coordinator.account(), Some(address(BOB)));

    h.coordinator.disconnect();
    assert_eq!(h.coordinator.stats().total_steps, 0);
    assert!(h.coordinator.history().is_empty());
}

#[tokio::test]
async fn test_leaderboard_is_stable_and_ranked() {
    let h = harness();
    h.contract.seed_record("five", record_data("Five", ALICE, Some(5)), 5).await;
    h.contract.seed_record("zero-a", record_data("Zero A", BOB, None), 99).await;
    h.contract.seed_record("ten", record_data("Ten", BOB, Some(10)), 10).await;
    h.contract.seed_record("zero-b", record_data("Zero B", ALICE, None), 42).await;
    h.connect(ALICE).await;

    let ids: Vec<String> = h.coordinator.leaderboard("").into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["ten", "five", "zero-a", "zero-b"]);

    let ids: Vec<String> = h
        .coordinator
        .leaderboard("zero")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["zero-a", "zero-b"]);
}

#[tokio::test]
async fn test_stats_only_count_verified_steps() {
    let h = harness();
    h.contract.seed_record("fitness-1", record_data("a", ALICE, Some(3000)), 3000).await;
    h.contract.seed_record("fitness-2", record_data("b", ALICE, None), 7000).await;
    h.connect(ALICE).await;

    let stats = h.coordinator.stats();
    assert_eq!(stats.total_steps, 3000);
    assert_eq!(stats.total_calories, 400);
    assert_eq!(stats.avg_duration, 30.0);
    assert_eq!(stats.goal_percent(), 30);
}

#[tokio::test]
async fn test_availability_check() {
    let h = harness();
    assert_eq!(h.coordinator.check_availability().await, Ok(true));
    assert_eq!(h.coordinator.status().kind, StatusKind::Success);

    h.contract.set_available(false).await;
    assert_eq!(h.coordinator.check_availability().await, Ok(false));

    h.contract
        .configure(|f| f.availability = Some("rpc down".into()))
        .await;
    assert!(h.coordinator.check_availability().await.is_err());
    assert_eq!(h.coordinator.status().kind, StatusKind::Error);
}
