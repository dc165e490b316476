//! Publish cycle scenarios
//!
//! Run against a scripted upstream, a recording channel and a manual clock,
//! with the cache on a real temp directory.

mod common;

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use rdo_dailies::cycle::CycleState;
use rdo_dailies::i18n::available_locales;
use rdo_dailies::models::{DailyDocument, Destination};
use rdo_dailies::storage::DestinationRegistry;

fn may_1_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn two_destinations() -> Arc<StaticDestinations> {
    Arc::new(StaticDestinations(vec![
        Destination::new(1, "en"),
        Destination::new(2, "ru"),
    ]))
}

#[tokio::test]
async fn test_fresh_fetch_is_delivered_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedHttp::serving(MAY_1_PUBLISH),
        may_1(7, 0, 0),
        &dir.path().join("db.json"),
    );
    let mut cycle = harness.cycle(two_destinations());

    let report = cycle.run_cycle().await;

    assert_eq!(report.date, may_1_date());
    assert!(!report.reused_cache);
    assert_eq!(report.fetch_attempts, 1);
    assert_eq!(report.delivered, vec![1, 2]);
    assert!(report.failed.is_empty());
    assert_eq!(cycle.state(), CycleState::Sleeping);

    let cached = harness.cache.load().await.unwrap().unwrap();
    assert_eq!(cached.date, may_1_date());
    assert_eq!(cached.companion_image.as_deref(), Some(IMAGE));
    assert_eq!(cached.delivered_to.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(cached.challenge_count(), 3);

    let messages = harness.channel.messages();
    assert!(messages[0].1.starts_with("May 01"));
    assert!(messages[0].1.contains("Complete a bounty: **3**"));
    assert!(messages[0].1.contains("Sell 3 items: **$500**"));
    assert!(harness.clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_failed_destination_stays_pending() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedHttp::serving(MAY_1_PUBLISH),
        may_1(7, 0, 0),
        &dir.path().join("db.json"),
    );
    let mut cycle = harness.cycle(two_destinations());

    harness.channel.fail_for(&[2]);
    let first = cycle.run_cycle().await;
    assert_eq!(first.delivered, vec![1]);
    assert_eq!(first.failed, vec![2]);

    let cached = harness.cache.load().await.unwrap().unwrap();
    assert!(cached.delivered_to.contains(&1));
    assert!(!cached.delivered_to.contains(&2));

    harness.channel.fail_for(&[]);
    harness.clock.advance(Duration::from_secs(600));
    let second = cycle.run_cycle().await;

    assert!(second.reused_cache);
    assert_eq!(second.delivered, vec![2]);
    assert_eq!(harness.channel.sent_to(), vec![1, 2]);
    assert_eq!(harness.http.calls_to(CHALLENGES_URL), 1);

    let cached = harness.cache.load().await.unwrap().unwrap();
    assert_eq!(cached.delivered_to.len(), 2);
}

#[tokio::test]
async fn test_cached_yesterday_reused_inside_grace_window() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedHttp::new(),
        may_1(3, 0, 0),
        &dir.path().join("db.json"),
    );

    let yesterday = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    let mut cached = DailyDocument::new(yesterday).with_companion_image(IMAGE.to_vec());
    cached.delivered_to.insert(1);
    harness.cache.save(&cached).await.unwrap();

    let mut cycle = harness.cycle(two_destinations());
    let report = cycle.run_cycle().await;

    assert!(report.reused_cache);
    assert_eq!(report.date, yesterday);
    assert_eq!(report.delivered, vec![2]);
    assert_eq!(harness.http.calls_to(CHALLENGES_URL), 0);
}

#[tokio::test]
async fn test_stale_upstream_is_polled_until_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let http = ScriptedHttp::serving(MAY_1_PUBLISH);
    http.script(
        CHALLENGES_URL,
        vec![
            Reply::Json(challenge_set(APRIL_30_PUBLISH)),
            Reply::Json(challenge_set(APRIL_30_PUBLISH)),
            Reply::Json(challenge_set(MAY_1_PUBLISH)),
        ],
    );
    let harness = Harness::new(http, may_1(6, 0, 30), &dir.path().join("db.json"));
    let mut cycle = harness.cycle(two_destinations());

    let report = cycle.run_cycle().await;

    assert_eq!(report.fetch_attempts, 3);
    assert_eq!(report.date, may_1_date());
    assert_eq!(
        harness.clock.sleeps(),
        vec![Duration::from_secs(300), Duration::from_secs(300)]
    );
    // Stale payloads never reach the companion endpoint
    assert_eq!(harness.http.calls_to(COMPANION_URL), 1);
}

#[tokio::test]
async fn test_poll_wait_capped_by_next_window() {
    let dir = tempfile::tempdir().unwrap();
    let http = ScriptedHttp::serving(MAY_1_PUBLISH);
    http.script(
        CHALLENGES_URL,
        vec![
            Reply::Json(challenge_set(APRIL_30_PUBLISH - 86_400)),
            Reply::Json(challenge_set(MAY_1_PUBLISH)),
        ],
    );
    // Two minutes before the window with upstream two days behind
    let harness = Harness::new(http, may_1(5, 58, 30), &dir.path().join("db.json"));
    let mut cycle = harness.cycle(two_destinations());

    let report = cycle.run_cycle().await;

    assert_eq!(report.date, may_1_date());
    assert_eq!(harness.clock.sleeps(), vec![Duration::from_secs(120)]);
}

#[tokio::test]
async fn test_schema_drift_and_outages_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let http = ScriptedHttp::serving(MAY_1_PUBLISH);
    let mut drifted = challenge_set(MAY_1_PUBLISH);
    drifted["challengeSets"][0]["role"] = serde_json::json!("ROBBER");
    http.script(
        CHALLENGES_URL,
        vec![
            Reply::Status(503),
            Reply::Json(drifted),
            Reply::Json(challenge_set(MAY_1_PUBLISH)),
        ],
    );
    let harness = Harness::new(http, may_1(12, 0, 0), &dir.path().join("db.json"));
    let mut cycle = harness.cycle(two_destinations());

    let report = cycle.run_cycle().await;

    assert_eq!(report.fetch_attempts, 3);
    assert_eq!(report.delivered, vec![1, 2]);
    assert_eq!(harness.clock.sleeps().len(), 2);
}

#[tokio::test]
async fn test_unresolvable_companion_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let http = ScriptedHttp::serving(MAY_1_PUBLISH);
    http.script(
        COMPANION_URL,
        vec![
            Reply::Json(serde_json::json!({ "location": { "id": "unmapped" } })),
            Reply::Json(companion_pointer()),
        ],
    );
    let harness = Harness::new(http, may_1(12, 0, 0), &dir.path().join("db.json"));
    let mut cycle = harness.cycle(two_destinations());

    let report = cycle.run_cycle().await;

    assert_eq!(report.fetch_attempts, 2);
    assert!(harness.cache.load().await.unwrap().unwrap().is_complete());
}

#[tokio::test]
async fn test_unwritable_cache_blocks_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    tokio::fs::write(&blocker, b"file").await.unwrap();

    let harness = Harness::new(
        ScriptedHttp::serving(MAY_1_PUBLISH),
        may_1(7, 0, 0),
        &blocker.join("db.json"),
    );
    let mut cycle = harness.cycle(two_destinations());

    let outcome = tokio::time::timeout(Duration::from_millis(200), cycle.run_cycle()).await;

    assert!(outcome.is_err(), "cycle must not move on without a saved document");
    assert!(harness.channel.sent_to().is_empty());
    assert!(harness
        .clock
        .sleeps()
        .iter()
        .all(|d| *d == Duration::from_secs(300)));
}

#[tokio::test]
async fn test_run_waits_for_next_window_after_first_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedHttp::serving(MAY_1_PUBLISH),
        may_1(7, 0, 0),
        &dir.path().join("db.json"),
    );
    let mut cycle = harness.cycle(two_destinations());

    // Upstream never rolls over to May 2, so the second day keeps polling
    let _ = tokio::time::timeout(Duration::from_millis(200), cycle.run()).await;

    let sleeps = harness.clock.sleeps();
    assert_eq!(sleeps[0], Duration::from_secs(23 * 3600 + 30));
    assert!(sleeps[1..].iter().all(|d| *d == Duration::from_secs(300)));
    assert_eq!(harness.channel.sent_to(), vec![1, 2]);
}

#[tokio::test]
async fn test_registry_changes_apply_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(
        DestinationRegistry::load(dir.path().join("settings.json"), available_locales())
            .await
            .unwrap(),
    );
    registry.register(10, 100, "en").await.unwrap();

    let harness = Harness::new(
        ScriptedHttp::serving(MAY_1_PUBLISH),
        may_1(7, 0, 0),
        &dir.path().join("db.json"),
    );
    let mut cycle = harness.cycle(registry.clone());

    assert_eq!(cycle.run_cycle().await.delivered, vec![100]);

    registry.register(20, 200, "de").await.unwrap();
    let report = cycle.run_cycle().await;

    assert_eq!(report.delivered, vec![200]);
    let messages = harness.channel.messages();
    assert!(messages[1].1.contains("Allgemeine Herausforderungen"));
}
