// ABOUTME: In-memory counters for credential exchange, sync runs, refreshes, and provider calls
// ABOUTME: Explicitly constructed and injected, read through a serializable snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use healthmetrics_core::errors::ProviderError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one service instance, reset on restart
#[derive(Debug, Default)]
pub struct SyncMetrics {
    exchange_total: AtomicU64,
    exchange_success: AtomicU64,
    exchange_failure: AtomicU64,

    sync_total: AtomicU64,
    sync_success: AtomicU64,
    sync_failure: AtomicU64,
    sync_duration_ms: AtomicU64,

    refresh_total: AtomicU64,
    refresh_failure: AtomicU64,

    disconnect_total: AtomicU64,
    disconnect_failure: AtomicU64,

    api_total: AtomicU64,
    api_success: AtomicU64,
    api_failure: AtomicU64,
    api_unauthorized: AtomicU64,
    api_timeout: AtomicU64,

    records_skipped: AtomicU64,
}

/// Point-in-time copy of [`SyncMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Credential exchanges attempted
    pub exchange_total: u64,
    /// Credential exchanges that stored tokens
    pub exchange_success: u64,
    /// Credential exchanges that failed
    pub exchange_failure: u64,
    /// Sync runs attempted
    pub sync_total: u64,
    /// Sync runs that completed
    pub sync_success: u64,
    /// Sync runs that failed
    pub sync_failure: u64,
    /// Total time spent in sync runs
    pub sync_duration_ms: u64,
    /// Mean sync duration, 0 before the first run
    pub sync_avg_ms: u64,
    /// Refresh exchanges attempted
    pub refresh_total: u64,
    /// Refresh exchanges that failed
    pub refresh_failure: u64,
    /// Disconnects attempted
    pub disconnect_total: u64,
    /// Disconnects that failed
    pub disconnect_failure: u64,
    /// Provider data requests made
    pub api_total: u64,
    /// Provider data requests that succeeded
    pub api_success: u64,
    /// Provider data requests that failed
    pub api_failure: u64,
    /// Failed requests answered with 401
    pub api_unauthorized: u64,
    /// Failed requests that timed out
    pub api_timeout: u64,
    /// Collection records the normalizer skipped
    pub records_skipped: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl SyncMetrics {
    /// Fresh counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a credential exchange outcome
    pub fn record_exchange(&self, success: bool) {
        bump(&self.exchange_total);
        bump(if success {
            &self.exchange_success
        } else {
            &self.exchange_failure
        });
    }

    /// Record a sync run outcome and its duration
    pub fn record_sync(&self, duration: Duration, success: bool) {
        bump(&self.sync_total);
        self.sync_duration_ms.fetch_add(
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        bump(if success {
            &self.sync_success
        } else {
            &self.sync_failure
        });
    }

    /// Record a refresh exchange outcome
    pub fn record_refresh(&self, success: bool) {
        bump(&self.refresh_total);
        if !success {
            bump(&self.refresh_failure);
        }
    }

    /// Record a disconnect outcome
    pub fn record_disconnect(&self, success: bool) {
        bump(&self.disconnect_total);
        if !success {
            bump(&self.disconnect_failure);
        }
    }

    /// Record one provider data request
    pub fn record_api_call(&self, error: Option<&ProviderError>) {
        bump(&self.api_total);
        match error {
            None => bump(&self.api_success),
            Some(e) => {
                bump(&self.api_failure);
                if e.is_unauthorized() {
                    bump(&self.api_unauthorized);
                } else if e.is_timeout() {
                    bump(&self.api_timeout);
                }
            }
        }
    }

    /// Record a record dropped by the normalizer
    pub fn record_skipped(&self) {
        bump(&self.records_skipped);
    }

    /// Read all counters
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let sync_total = load(&self.sync_total);
        let sync_duration_ms = load(&self.sync_duration_ms);

        MetricsSnapshot {
            exchange_total: load(&self.exchange_total),
            exchange_success: load(&self.exchange_success),
            exchange_failure: load(&self.exchange_failure),
            sync_total,
            sync_success: load(&self.sync_success),
            sync_failure: load(&self.sync_failure),
            sync_duration_ms,
            sync_avg_ms: sync_duration_ms.checked_div(sync_total).unwrap_or(0),
            refresh_total: load(&self.refresh_total),
            refresh_failure: load(&self.refresh_failure),
            disconnect_total: load(&self.disconnect_total),
            disconnect_failure: load(&self.disconnect_failure),
            api_total: load(&self.api_total),
            api_success: load(&self.api_success),
            api_failure: load(&self.api_failure),
            api_unauthorized: load(&self.api_unauthorized),
            api_timeout: load(&self.api_timeout),
            records_skipped: load(&self.records_skipped),
        }
    }
}
