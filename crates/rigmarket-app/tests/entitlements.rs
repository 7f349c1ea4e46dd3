//! Entitlement store behavior over in-memory storage and a simulated clock

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Months};
use proptest::prelude::*;
use rigmarket_app::entitlements::{
    EntitlementError, EntitlementStore, MeteredAction, PlanFeatures, PlanTier, SubscriptionData,
    UsageCounters, SUBSCRIPTION_KEY, USAGE_KEY,
};
use rigmarket_testkit::{MemoryStorageHandler, SimulatedTimeHandler};

async fn load(storage: &MemoryStorageHandler, clock: &SimulatedTimeHandler) -> EntitlementStore {
    EntitlementStore::load(Arc::new(storage.clone()), Arc::new(clock.clone()))
        .await
        .unwrap()
}

fn seed_usage(storage: &MemoryStorageHandler, builds: u32, upgrades: u32, reset: &str) {
    storage.insert_raw(
        USAGE_KEY,
        format!(
            r#"{{"aiBuildsUsed":{builds},"aiUpgradesUsed":{upgrades},"lastResetDate":"{reset}"}}"#
        ),
    );
}

fn seed_plan(storage: &MemoryStorageHandler, plan: &str) {
    storage.insert_raw(
        SUBSCRIPTION_KEY,
        format!(r#"{{"plan":"{plan}","isActive":true}}"#),
    );
}

#[tokio::test]
async fn first_launch_starts_free_and_persists() {
    let storage = MemoryStorageHandler::new();
    let clock = SimulatedTimeHandler::default();

    let store = load(&storage, &clock).await;
    let data = store.snapshot();

    assert_eq!(data.plan(), PlanTier::Free);
    assert!(data.is_active());
    assert_eq!(*data.usage(), UsageCounters::fresh(clock.now()));
    assert!(storage.raw(SUBSCRIPTION_KEY).is_some());
    assert!(storage.raw(USAGE_KEY).is_some());
}

#[tokio::test]
async fn free_plan_allows_two_builds() {
    let storage = MemoryStorageHandler::new();
    let store = load(&storage, &SimulatedTimeHandler::default()).await;

    let mut results = Vec::new();
    for _ in 0..3 {
        results.push(store.consume(MeteredAction::AiBuild).await);
    }
    assert_eq!(results, vec![true, true, false]);
    assert_eq!(store.usage_percentage(MeteredAction::AiBuild), 100.0);
    assert_eq!(store.remaining(MeteredAction::AiBuild), Some(0));
    assert!(!store.can_use(MeteredAction::AiBuild));
}

#[tokio::test]
async fn refused_consume_changes_nothing() {
    let storage = MemoryStorageHandler::new();
    let store = load(&storage, &SimulatedTimeHandler::default()).await;

    assert!(store.consume(MeteredAction::AiUpgrade).await);
    let before = store.snapshot();
    let stored = storage.raw(USAGE_KEY);
    let version = store.binding().version();

    for _ in 0..5 {
        assert!(!store.consume(MeteredAction::AiUpgrade).await);
    }

    assert_eq!(store.snapshot(), before);
    assert_eq!(storage.raw(USAGE_KEY), stored);
    assert_eq!(store.binding().version(), version);
}

#[tokio::test]
async fn upgrade_keeps_usage_and_runs_one_month() {
    let storage = MemoryStorageHandler::new();
    let clock = SimulatedTimeHandler::default();
    seed_plan(&storage, "free");
    seed_usage(&storage, 3, 1, "2023-12-25T00:00:00Z");

    let store = load(&storage, &clock).await;
    store.upgrade(PlanTier::Pro).await.unwrap();

    let data = store.snapshot();
    assert_eq!(data.plan(), PlanTier::Pro);
    assert_eq!(*data.features(), PlanFeatures::for_plan(PlanTier::Pro));
    assert_eq!(data.usage().ai_builds_used, 3);
    assert_eq!(data.usage().ai_upgrades_used, 1);
    assert_eq!(
        data.subscription_end_date(),
        clock.now().checked_add_months(Months::new(1))
    );
    assert!(data.is_active());

    // Survives a restart
    let reloaded = load(&storage, &clock).await;
    assert_eq!(reloaded.snapshot(), data);
}

#[tokio::test]
async fn reset_zeroes_counters() {
    let storage = MemoryStorageHandler::new();
    let clock = SimulatedTimeHandler::default();

    for plan in [PlanTier::Free, PlanTier::Basic, PlanTier::Pro] {
        let store = load(&storage, &clock).await;
        store.upgrade(plan).await.unwrap();
        while store.consume(MeteredAction::AiUpgrade).await {}
        store.consume(MeteredAction::AiBuild).await;

        clock.advance(Duration::hours(1));
        store.reset_usage().await.unwrap();

        let usage = *store.snapshot().usage();
        assert_eq!(usage, UsageCounters::fresh(clock.now()));
        assert!(store.can_use(MeteredAction::AiBuild));
        assert!(store.can_use(MeteredAction::AiUpgrade));
    }
}

#[tokio::test]
async fn elapsed_window_resets_on_load() {
    let storage = MemoryStorageHandler::new();
    let clock = SimulatedTimeHandler::default();
    seed_plan(&storage, "basic");
    // 31 days before 2024-01-01
    seed_usage(&storage, 7, 4, "2023-12-01T00:00:00Z");

    let store = load(&storage, &clock).await;
    let usage = *store.snapshot().usage();

    assert_eq!(usage.ai_builds_used, 0);
    assert_eq!(usage.ai_upgrades_used, 0);
    assert_eq!(usage.last_reset_date, clock.now());

    let stored: UsageCounters = serde_json::from_slice(&storage.raw(USAGE_KEY).unwrap()).unwrap();
    assert_eq!(stored, usage);
}

#[tokio::test]
async fn window_not_elapsed_keeps_usage() {
    let storage = MemoryStorageHandler::new();
    let clock = SimulatedTimeHandler::default();
    seed_plan(&storage, "basic");
    seed_usage(&storage, 7, 4, "2023-12-04T00:00:00Z");

    let store = load(&storage, &clock).await;
    assert_eq!(store.snapshot().usage().ai_builds_used, 7);

    clock.advance_days(1);
    assert!(!store.roll_over_if_due().await.unwrap());
    clock.advance_days(1);
    assert!(store.roll_over_if_due().await.unwrap());
    assert_eq!(store.snapshot().usage().ai_builds_used, 0);
}

#[tokio::test]
async fn features_match_table_after_reload() {
    let clock = SimulatedTimeHandler::default();
    for plan in PlanTier::ALL {
        let storage = MemoryStorageHandler::new();
        load(&storage, &clock).await.upgrade(plan).await.unwrap();

        let reloaded = load(&storage, &clock).await;
        assert_eq!(reloaded.plan(), plan);
        assert_eq!(*reloaded.snapshot().features(), PlanFeatures::for_plan(plan));
    }
}

#[tokio::test]
async fn stored_features_are_not_trusted() {
    let storage = MemoryStorageHandler::new();
    storage.insert_raw(
        SUBSCRIPTION_KEY,
        r#"{"plan":"free","features":{"aiBuildsPerMonth":-1,"aiUpgradesPerMonth":-1},"isActive":true}"#,
    );

    let store = load(&storage, &SimulatedTimeHandler::default()).await;
    assert_eq!(*store.snapshot().features(), PlanFeatures::for_plan(PlanTier::Free));
}

#[tokio::test]
async fn corrupt_records_are_rejected() {
    let clock = SimulatedTimeHandler::default();

    let storage = MemoryStorageHandler::new();
    seed_plan(&storage, "platinum");
    let err = EntitlementStore::load(Arc::new(storage), Arc::new(clock.clone()))
        .await
        .unwrap_err();
    assert_matches!(err, EntitlementError::CorruptRecord { key: SUBSCRIPTION_KEY, .. });

    let storage = MemoryStorageHandler::new();
    seed_plan(&storage, "pro");
    storage.insert_raw(USAGE_KEY, "not json");
    let err = EntitlementStore::load(Arc::new(storage), Arc::new(clock))
        .await
        .unwrap_err();
    assert_matches!(err, EntitlementError::CorruptRecord { key: USAGE_KEY, .. });
}

#[tokio::test]
async fn save_failures_keep_memory_state() {
    let storage = MemoryStorageHandler::new();
    let store = load(&storage, &SimulatedTimeHandler::default()).await;
    let stored = storage.raw(USAGE_KEY);

    storage.set_fail_writes(true);
    assert!(store.consume(MeteredAction::AiBuild).await);
    store.upgrade(PlanTier::Premium).await.unwrap();

    assert_eq!(store.snapshot().usage().ai_builds_used, 1);
    assert_eq!(store.plan(), PlanTier::Premium);
    assert_eq!(storage.raw(USAGE_KEY), stored);
}

#[tokio::test]
async fn binding_reports_changes() {
    let storage = MemoryStorageHandler::new();
    let store = load(&storage, &SimulatedTimeHandler::default()).await;
    let mut watcher = store.binding().watch();

    store.consume(MeteredAction::AiBuild).await;
    let seen = watcher.poll().unwrap();
    assert_eq!(seen.usage().ai_builds_used, 1);
    assert!(watcher.poll().is_none());
}

#[tokio::test]
async fn concurrent_consumes_respect_quota() {
    let storage = MemoryStorageHandler::new();
    let store = Arc::new(load(&storage, &SimulatedTimeHandler::default()).await);
    store.upgrade(PlanTier::Basic).await.unwrap();

    let tasks: Vec<_> = (0..25)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.consume(MeteredAction::AiBuild).await })
        })
        .collect();

    let mut granted = 0;
    for task in tasks {
        if task.await.unwrap() {
            granted += 1;
        }
    }
    assert_eq!(granted, 10);
    assert_eq!(store.snapshot().usage().ai_builds_used, 10);
}

// ============================================================================
// Property tests
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Consume(MeteredAction),
    ChangePlan(PlanTier),
    Reset,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let action = prop_oneof![Just(MeteredAction::AiBuild), Just(MeteredAction::AiUpgrade)];
    let plan = prop_oneof![
        Just(PlanTier::Free),
        Just(PlanTier::Basic),
        Just(PlanTier::Pro),
        Just(PlanTier::Premium),
    ];
    prop_oneof![
        6 => action.prop_map(Op::Consume),
        2 => plan.prop_map(Op::ChangePlan),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #[test]
    fn counters_only_move_up_between_resets(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let now = rigmarket_testkit::fixtures::base_time();
        let mut data = SubscriptionData::new_free(now);

        for op in ops {
            let before = *data.usage();
            match op {
                Op::Consume(action) => {
                    let allowed = data.can_use(action);
                    prop_assert_eq!(data.record_use(action), allowed);
                    let after = *data.usage();
                    let expected = before.used(action) + u32::from(allowed);
                    prop_assert_eq!(after.used(action), expected);
                }
                Op::ChangePlan(plan) => {
                    data.change_plan(plan, now);
                    prop_assert_eq!(*data.usage(), before);
                    prop_assert_eq!(*data.features(), PlanFeatures::for_plan(plan));
                }
                Op::Reset => {
                    data.reset_usage(now);
                    prop_assert_eq!(data.usage().ai_builds_used, 0);
                    prop_assert_eq!(data.usage().ai_upgrades_used, 0);
                }
            }
            let pct = data.usage_percentage(MeteredAction::AiBuild);
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }
}
