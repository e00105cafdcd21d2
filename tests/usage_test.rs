//! Tests for windowed usage counters and quota-gated usability.

use std::sync::Arc;
use std::time::Duration;

use relaygate::clock::ManualClock;
use relaygate::providers::{Dialect, HttpProvider, Provider, ProviderConfig, RetryConfig};
use relaygate::store::MemoryStore;
use relaygate::{Granularity, UsageCounters};

/// Start of a minute, hour and day window.
const T0: u64 = 1_700_006_400;

fn counters(clock: Arc<ManualClock>) -> Arc<UsageCounters> {
    Arc::new(UsageCounters::new(Arc::new(MemoryStore::new()), clock))
}

fn provider(usage: Arc<UsageCounters>, credential: &str, rate_limit: u32) -> HttpProvider {
    let config = ProviderConfig::new(
        "gemini",
        "http://127.0.0.1:9/unused",
        rate_limit,
        Dialect::Gemini,
    )
    .credential(credential);
    HttpProvider::new(config, usage, RetryConfig::disabled(), Duration::from_secs(1)).unwrap()
}

#[tokio::test]
async fn unset_counter_reads_zero() {
    let usage = counters(Arc::new(ManualClock::new(T0)));
    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 0);
}

#[tokio::test]
async fn increment_returns_post_increment_value() {
    let usage = counters(Arc::new(ManualClock::new(T0)));
    assert_eq!(usage.increment("gemini", Granularity::Minute).await, 1);
    assert_eq!(usage.increment("gemini", Granularity::Minute).await, 2);
    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 2);
    // other providers and granularities are independent
    assert_eq!(usage.get_count("deepseek", Granularity::Minute).await, 0);
    assert_eq!(usage.get_count("gemini", Granularity::Hour).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    let usage = counters(Arc::new(ManualClock::new(T0)));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..64 {
        let usage = usage.clone();
        tasks.spawn(async move { usage.increment("gemini", Granularity::Minute).await });
    }
    let mut seen = Vec::new();
    while let Some(result) = tasks.join_next().await {
        seen.push(result.unwrap());
    }

    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 64);
    // every caller observed a distinct post-increment value
    seen.sort_unstable();
    assert_eq!(seen, (1..=64).collect::<Vec<u64>>());
}

#[tokio::test]
async fn charge_counts_every_granularity() {
    let usage = counters(Arc::new(ManualClock::new(T0)));
    assert_eq!(usage.charge("gemini").await, 1);
    assert_eq!(usage.charge("gemini").await, 2);

    let stats = usage.stats("gemini", 60).await;
    assert_eq!(stats.minute, 2);
    assert_eq!(stats.hour, 2);
    assert_eq!(stats.day, 2);
    assert_eq!(stats.minute_limit, 60);
}

#[tokio::test]
async fn minute_rollover_starts_a_fresh_counter() {
    let clock = Arc::new(ManualClock::new(T0));
    let usage = counters(clock.clone());
    usage.charge("gemini").await;
    usage.charge("gemini").await;

    clock.advance(Duration::from_secs(60));

    let stats = usage.stats("gemini", 60).await;
    assert_eq!(stats.minute, 0);
    assert_eq!(stats.hour, 2);
    assert_eq!(stats.day, 2);
}

#[tokio::test]
async fn usable_until_limit_then_again_after_rollover() {
    let clock = Arc::new(ManualClock::new(T0));
    let usage = counters(clock.clone());
    let provider = provider(usage.clone(), "key", 2);

    assert!(provider.is_usable().await);
    usage.charge("gemini").await;
    assert!(provider.is_usable().await);
    usage.charge("gemini").await;
    assert!(!provider.is_usable().await);

    clock.advance(Duration::from_secs(30));
    assert!(!provider.is_usable().await, "still inside the same minute window");

    clock.advance(Duration::from_secs(30));
    assert!(provider.is_usable().await);
}

#[tokio::test]
async fn checking_usability_does_not_consume_quota() {
    let usage = counters(Arc::new(ManualClock::new(T0)));
    let provider = provider(usage.clone(), "key", 1);
    for _ in 0..5 {
        assert!(provider.is_usable().await);
    }
    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 0);
}

#[tokio::test]
async fn missing_credential_is_never_usable() {
    let usage = counters(Arc::new(ManualClock::new(T0)));
    let provider = provider(usage, "", 100);
    assert!(!provider.is_usable().await);
}
