// ABOUTME: Run orchestrator sequencing token check, fetches, raw archival, and normalized upserts
// ABOUTME: Records failures as the integration's last error and clears it on full success
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sync Run Orchestration
//!
//! One run walks a fixed order: token check, profile, body measurement, then
//! the cycle, recovery, sleep, and workout collections. Each record's raw
//! payload is archived before its typed row is written, and the primary-sleep
//! pass runs right after the sleep collection. Records written before a
//! failure stay in place; every write is keyed for replace-on-conflict so the
//! next run repairs partial progress.

use super::report::{ResourceReport, SyncReport};
use super::token_manager::TokenManager;
use crate::clock::Clock;
use crate::context::SyncContext;
use crate::database_plugins::IntegrationStore;
use crate::metrics::SyncMetrics;
use healthmetrics_core::constants::sync::LAST_ERROR_MAX_CHARS;
use healthmetrics_core::errors::{SyncError, SyncResult};
use healthmetrics_core::models::ResourceType;
use healthmetrics_core::payload::Payload;
use healthmetrics_providers::whoop::normalizer::extract_source_id;
use healthmetrics_providers::whoop::{normalize, WhoopApiClient};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Sequences one sync run for one integration
#[derive(Clone)]
pub struct SyncOrchestrator {
    store: Arc<dyn IntegrationStore>,
    api: Arc<WhoopApiClient>,
    tokens: TokenManager,
    clock: Arc<dyn Clock>,
    metrics: Arc<SyncMetrics>,
}

impl SyncOrchestrator {
    /// Create an orchestrator over injected collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn IntegrationStore>,
        api: Arc<WhoopApiClient>,
        tokens: TokenManager,
        clock: Arc<dyn Clock>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            store,
            api,
            tokens,
            clock,
            metrics,
        }
    }

    /// Run a full sync and record its outcome on the integration
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, tagged with the failing step.
    /// The truncated message is stored as the integration's last error first.
    #[instrument(
        skip(self, ctx),
        fields(provider = "whoop", correlation_id = %ctx.correlation_id())
    )]
    pub async fn run(&self, ctx: &SyncContext, user_id: &str, integration_id: Uuid) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let outcome = self.execute(ctx, integration_id, started).await;
        let elapsed = started.elapsed();
        self.metrics.record_sync(elapsed, outcome.is_ok());

        match outcome {
            Ok(report) => {
                info!(
                    duration_ms = report.duration_ms,
                    raw_events = report.total_raw_events(),
                    records = report.total_records(),
                    refreshed = report.refreshed,
                    "WHOOP sync completed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, code = ?e.code(), "WHOOP sync failed");
                self.record_failure(integration_id, &e).await;
                Err(e)
            }
        }
    }

    async fn execute(&self, ctx: &SyncContext, integration_id: Uuid, started: Instant) -> SyncResult<SyncReport> {
        let grant = self.tokens.ensure_access_token(ctx, integration_id).await?;
        let access_token = grant.access_token.as_str();

        let mut resources = Vec::with_capacity(ResourceType::SINGLE_OBJECTS.len() + ResourceType::COLLECTIONS.len());
        for resource in ResourceType::SINGLE_OBJECTS {
            resources.push(self.sync_object(ctx, integration_id, access_token, resource).await?);
        }

        for resource in ResourceType::COLLECTIONS {
            resources.push(
                self.sync_collection(ctx, integration_id, access_token, resource)
                    .await?,
            );
            if resource == ResourceType::Sleep {
                let examined = ctx
                    .guard("primary sleep", self.store.select_primary_sleep(integration_id))
                    .await?;
                debug!(examined, "primary sleep pass complete");
            }
        }

        ctx.guard(
            "last sync update",
            self.store.update_last_sync(integration_id, self.clock.now()),
        )
        .await?;

        if let Err(e) = ctx
            .guard("last error clear", self.store.upsert_last_error(integration_id, None))
            .await
        {
            warn!(error = %e, "failed to clear last sync error");
        }

        Ok(SyncReport {
            integration_id,
            correlation_id: ctx.correlation_id().to_owned(),
            refreshed: grant.refreshed,
            resources,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn sync_object(
        &self,
        ctx: &SyncContext,
        integration_id: Uuid,
        access_token: &str,
        resource: ResourceType,
    ) -> SyncResult<ResourceReport> {
        let mut report = ResourceReport::new(resource);

        let record = ctx
            .guard(&format!("{resource} fetch"), async {
                let result = self.api.fetch_object(access_token, resource).await;
                self.metrics.record_api_call(result.as_ref().err());
                result
            })
            .await?;
        report.pages_fetched = 1;

        let Some(source_id) = extract_source_id(&record, resource.fallback_source_id()) else {
            report.records_skipped = 1;
            return Ok(report);
        };

        if resource == ResourceType::Profile {
            if let Some(provider_user_id) = Payload::new(&record).identifier("user_id") {
                self.remember_provider_user(ctx, integration_id, &provider_user_id)
                    .await;
            }
        }

        let payload = Value::Object(record);
        ctx.guard(
            &format!("{resource} raw store"),
            self.store
                .upsert_raw_event(integration_id, resource, &source_id, &payload),
        )
        .await?;
        report.raw_events_stored = 1;

        Ok(report)
    }

    async fn sync_collection(
        &self,
        ctx: &SyncContext,
        integration_id: Uuid,
        access_token: &str,
        resource: ResourceType,
    ) -> SyncResult<ResourceReport> {
        let fetch_step = format!("{resource} fetch");
        let raw_step = format!("{resource} raw store");
        let store_step = format!("{resource} store");

        let mut report = ResourceReport::new(resource);
        let mut cursor = self.api.collection(access_token, resource);

        loop {
            let page = ctx
                .guard(&fetch_step, async {
                    let result = cursor.next_page().await;
                    if !matches!(result, Ok(None)) {
                        self.metrics.record_api_call(result.as_ref().err());
                    }
                    result
                })
                .await?;
            let Some(records) = page else {
                break;
            };

            for record in records {
                let Some(source_id) = extract_source_id(&record, None) else {
                    debug!(%resource, "skipping record without id");
                    report.records_skipped += 1;
                    self.metrics.record_skipped();
                    continue;
                };

                let normalized = normalize(resource, integration_id, &record);
                let payload = Value::Object(record);

                ctx.guard(
                    &raw_step,
                    self.store
                        .upsert_raw_event(integration_id, resource, &source_id, &payload),
                )
                .await?;
                report.raw_events_stored += 1;

                match normalized {
                    Some(normalized) => {
                        ctx.guard(&store_step, self.store.upsert_normalized(&normalized))
                            .await?;
                        report.records_normalized += 1;
                    }
                    None => {
                        report.records_skipped += 1;
                        self.metrics.record_skipped();
                    }
                }
            }
        }

        report.pages_fetched = cursor.pages_fetched();
        debug!(
            %resource,
            pages = report.pages_fetched,
            raw_events = report.raw_events_stored,
            records = report.records_normalized,
            skipped = report.records_skipped,
            "collection synced"
        );
        Ok(report)
    }

    /// Best effort; a failure here never fails the run
    async fn remember_provider_user(&self, ctx: &SyncContext, integration_id: Uuid, provider_user_id: &str) {
        if let Err(e) = ctx
            .guard(
                "provider user id",
                self.store
                    .upsert_provider_user_id(integration_id, provider_user_id),
            )
            .await
        {
            warn!(error = %e, "failed to store WHOOP user id");
        }
    }

    /// Store the truncated `"<step>: <cause>"` message, outside the run's cancellation scope
    async fn record_failure(&self, integration_id: Uuid, error: &SyncError) {
        let message = error.detail();
        let message = truncate_chars(&message, LAST_ERROR_MAX_CHARS);
        if let Err(e) = self
            .store
            .upsert_last_error(integration_id, Some(message))
            .await
        {
            warn!(error = %e, "failed to record last sync error");
        }
    }
}

/// Longest prefix of `value` holding at most `max_chars` characters
fn truncate_chars(value: &str, max_chars: usize) -> &str {
    value
        .char_indices()
        .nth(max_chars)
        .map_or(value, |(idx, _)| &value[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_keeps_short_messages() {
        assert_eq!(truncate_chars("sleep fetch: boom", 500), "sleep fetch: boom");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let message = "é".repeat(600);
        let truncated = truncate_chars(&message, 500);
        assert_eq!(truncated.chars().count(), 500);
        assert!(message.starts_with(truncated));
    }
}
