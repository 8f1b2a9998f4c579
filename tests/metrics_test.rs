// ABOUTME: Tests for the in-memory sync counters and their snapshot
// ABOUTME: Outcome splits, provider call classification, and average duration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::errors::ProviderError;
use healthmetrics_sync::metrics::SyncMetrics;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_fresh_snapshot_is_zero() {
    let snapshot = SyncMetrics::new().snapshot();
    assert_eq!(snapshot.sync_total, 0);
    assert_eq!(snapshot.sync_avg_ms, 0);
    assert_eq!(snapshot.api_total, 0);
}

#[test]
fn test_sync_outcomes_and_average() {
    let metrics = SyncMetrics::new();
    metrics.record_sync(Duration::from_millis(100), true);
    metrics.record_sync(Duration::from_millis(300), false);
    metrics.record_sync(Duration::from_millis(200), true);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.sync_total, 3);
    assert_eq!(snapshot.sync_success, 2);
    assert_eq!(snapshot.sync_failure, 1);
    assert_eq!(snapshot.sync_duration_ms, 600);
    assert_eq!(snapshot.sync_avg_ms, 200);
}

#[test]
fn test_api_calls_classified() {
    let metrics = SyncMetrics::new();
    metrics.record_api_call(None);
    metrics.record_api_call(Some(&ProviderError::unauthorized(WHOOP)));
    metrics.record_api_call(Some(&ProviderError::timeout(WHOOP, 30)));
    metrics.record_api_call(Some(&ProviderError::api(WHOOP, 500, "boom")));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.api_total, 4);
    assert_eq!(snapshot.api_success, 1);
    assert_eq!(snapshot.api_failure, 3);
    assert_eq!(snapshot.api_unauthorized, 1);
    assert_eq!(snapshot.api_timeout, 1);
}

#[test]
fn test_exchange_refresh_disconnect_and_skips() {
    let metrics = SyncMetrics::new();
    metrics.record_exchange(true);
    metrics.record_exchange(false);
    metrics.record_refresh(true);
    metrics.record_refresh(false);
    metrics.record_disconnect(true);
    metrics.record_skipped();
    metrics.record_skipped();

    let snapshot = metrics.snapshot();
    assert_eq!(
        (snapshot.exchange_total, snapshot.exchange_success, snapshot.exchange_failure),
        (2, 1, 1)
    );
    assert_eq!((snapshot.refresh_total, snapshot.refresh_failure), (2, 1));
    assert_eq!((snapshot.disconnect_total, snapshot.disconnect_failure), (1, 0));
    assert_eq!(snapshot.records_skipped, 2);
}

#[tokio::test]
async fn test_counters_shared_across_tasks() {
    let metrics = Arc::new(SyncMetrics::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let metrics = Arc::clone(&metrics);
            tokio::spawn(async move {
                for _ in 0..100 {
                    metrics.record_api_call(None);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(metrics.snapshot().api_success, 800);
}

#[test]
fn test_snapshot_serializes() {
    let metrics = SyncMetrics::new();
    metrics.record_skipped();
    let json = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(json["records_skipped"], 1);
}
