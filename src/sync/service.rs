// ABOUTME: Entry points used by HTTP handlers and the scheduler: exchange, sync, disconnect
// ABOUTME: Wires the vault, OAuth client, fetcher, and store into one injectable service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::orchestrator::SyncOrchestrator;
use super::report::{SyncOutcome, SyncReport};
use super::token_manager::{TokenManager, MAX_EXPIRES_IN_SECS};
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::context::SyncContext;
use crate::crypto::TokenVault;
use crate::database_plugins::IntegrationStore;
use crate::metrics::SyncMetrics;
use chrono::Duration as TokenLifetime;
use futures_util::stream::{self, StreamExt};
use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::errors::{SyncError, SyncResult};
use healthmetrics_core::models::{Integration, StoredToken};
use healthmetrics_providers::whoop::{OAuthCredentials, TokenResponse, WhoopApiClient, WhoopOAuthClient};
use healthmetrics_providers::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// WHOOP integration service
#[derive(Clone)]
pub struct IntegrationService {
    store: Arc<dyn IntegrationStore>,
    vault: Arc<TokenVault>,
    oauth: Arc<WhoopOAuthClient>,
    orchestrator: SyncOrchestrator,
    clock: Arc<dyn Clock>,
    metrics: Arc<SyncMetrics>,
    redirect_url: String,
    run_deadline: Duration,
    concurrency: usize,
}

impl IntegrationService {
    /// Build the service from configuration and injected capabilities
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the encryption key is unusable
    pub fn new(
        config: &SyncConfig,
        store: Arc<dyn IntegrationStore>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        metrics: Arc<SyncMetrics>,
    ) -> SyncResult<Self> {
        let vault = Arc::new(TokenVault::from_key(&config.encryption_key)?);
        let oauth = Arc::new(WhoopOAuthClient::new(
            Arc::clone(&transport),
            OAuthCredentials {
                client_id: config.whoop.client_id.clone(),
                client_secret: config.whoop.client_secret.clone(),
            },
            config.whoop.token_url.clone(),
            config.whoop.token_timeout,
        ));
        let api = Arc::new(WhoopApiClient::new(
            transport,
            config.whoop.api_base_url.clone(),
            config.whoop.api_timeout,
        ));

        let tokens = TokenManager::new(
            Arc::clone(&store),
            Arc::clone(&vault),
            Arc::clone(&oauth),
            Arc::clone(&clock),
            Arc::clone(&metrics),
        );
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&store),
            api,
            tokens,
            Arc::clone(&clock),
            Arc::clone(&metrics),
        );

        Ok(Self {
            store,
            vault,
            oauth,
            orchestrator,
            clock,
            metrics,
            redirect_url: config.whoop.redirect_url.clone(),
            run_deadline: config.run_deadline,
            concurrency: config.concurrency,
        })
    }

    /// Shared metrics counters
    #[must_use]
    pub const fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Deadline applied to each run started by the scheduler path
    #[must_use]
    pub const fn run_deadline(&self) -> Duration {
        self.run_deadline
    }

    /// Exchange an authorization code, store encrypted tokens, and mark connected
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for empty fields or a redirect URI that is not the
    ///   configured one
    /// - Upstream errors from the code exchange
    /// - `Vault` or `Persistence` errors while storing
    #[instrument(
        skip(self, ctx, code),
        fields(provider = WHOOP, correlation_id = %ctx.correlation_id())
    )]
    pub async fn exchange_credentials(
        &self,
        ctx: &SyncContext,
        user_id: &str,
        code: &str,
        redirect_uri: &str,
    ) -> SyncResult<Uuid> {
        let result = self.exchange(ctx, user_id, code, redirect_uri).await;
        self.metrics.record_exchange(result.is_ok());
        match &result {
            Ok(integration_id) => info!(%integration_id, "WHOOP integration connected"),
            Err(e) => warn!(error = %e, "WHOOP credential exchange failed"),
        }
        result
    }

    async fn exchange(&self, ctx: &SyncContext, user_id: &str, code: &str, redirect_uri: &str) -> SyncResult<Uuid> {
        if user_id.trim().is_empty() {
            return Err(SyncError::invalid_input("user_id is required"));
        }
        if code.trim().is_empty() {
            return Err(SyncError::invalid_input("code is required"));
        }
        if redirect_uri.trim().is_empty() {
            return Err(SyncError::invalid_input("redirect_uri is required"));
        }
        if redirect_uri != self.redirect_url {
            return Err(SyncError::invalid_input("redirect_uri does not match the registered URL"));
        }

        let response = ctx
            .guard("code exchange", self.oauth.exchange_code(code, redirect_uri))
            .await?;
        let token = self
            .seal(&response)
            .map_err(|e| e.context("token encrypt"))?;

        let integration_id = ctx
            .guard("integration upsert", self.store.upsert_integration(user_id, WHOOP))
            .await?;
        ctx.guard("token store", self.store.upsert_token(integration_id, &token))
            .await?;
        ctx.guard("mark connected", self.store.mark_connected(integration_id))
            .await?;

        Ok(integration_id)
    }

    fn seal(&self, response: &TokenResponse) -> SyncResult<StoredToken> {
        Ok(StoredToken {
            access_token_encrypted: self.vault.encrypt(&response.access_token)?,
            refresh_token_encrypted: response
                .refresh_token
                .as_deref()
                .map(|refresh| self.vault.encrypt(refresh))
                .transpose()?,
            expires_at: Some(
                self.clock.now()
                    + TokenLifetime::seconds(response.expires_in.clamp(0, MAX_EXPIRES_IN_SECS)),
            ),
            scopes: response.scopes().unwrap_or_default(),
        })
    }

    /// Run one sync for a known integration
    ///
    /// # Errors
    ///
    /// `MissingToken` when no usable credential exists, otherwise the first
    /// step error of the run
    pub async fn run_sync(&self, ctx: &SyncContext, user_id: &str, integration_id: Uuid) -> SyncResult<SyncReport> {
        self.orchestrator.run(ctx, user_id, integration_id).await
    }

    /// Handler path: resolve the user's integration and sync it
    ///
    /// # Errors
    ///
    /// `NotFound` without an integration, `NotConnected` when it is
    /// disconnected, otherwise as [`Self::run_sync`]
    pub async fn sync_user(&self, ctx: &SyncContext, user_id: &str) -> SyncResult<SyncReport> {
        let integration = self.lookup(ctx, user_id).await?;
        if !integration.is_connected() {
            return Err(SyncError::not_connected(integration.id));
        }
        self.run_sync(ctx, user_id, integration.id).await
    }

    /// Delete stored tokens and mark the integration disconnected
    ///
    /// # Errors
    ///
    /// `NotFound` without an integration, `Persistence` on storage failure
    #[instrument(
        skip(self, ctx),
        fields(provider = WHOOP, correlation_id = %ctx.correlation_id())
    )]
    pub async fn disconnect(&self, ctx: &SyncContext, user_id: &str) -> SyncResult<()> {
        let result = async {
            let integration = self.lookup(ctx, user_id).await?;
            let deleted = ctx
                .guard("token delete", self.store.delete_tokens(integration.id))
                .await?;
            ctx.guard("mark disconnected", self.store.mark_disconnected(integration.id))
                .await?;
            info!(integration_id = %integration.id, deleted, "WHOOP integration disconnected");
            Ok::<(), SyncError>(())
        }
        .await;
        self.metrics.record_disconnect(result.is_ok());
        result
    }

    /// Scheduler path: sync every connected integration with bounded concurrency
    ///
    /// One integration failing never stops the others; each gets its own
    /// outcome, its own run deadline, and a correlation id derived from `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the connected integrations cannot be listed
    #[instrument(
        skip(self, ctx),
        fields(provider = WHOOP, correlation_id = %ctx.correlation_id())
    )]
    pub async fn sync_all_connected(&self, ctx: &SyncContext) -> SyncResult<Vec<SyncOutcome>> {
        let connected = ctx
            .guard("list connected", self.store.list_connected_integrations(WHOOP))
            .await?;
        info!(count = connected.len(), concurrency = self.concurrency, "syncing connected integrations");

        let outcomes: Vec<SyncOutcome> = stream::iter(connected)
            .map(|integration| async move {
                let child = ctx.child(&integration.id.to_string(), self.run_deadline);
                let result = self.run_sync(&child, &integration.user_id, integration.id).await;
                SyncOutcome::from_result(integration.id, integration.user_id, result)
            })
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(total = outcomes.len(), failed, "scheduled sync sweep finished");
        Ok(outcomes)
    }

    async fn lookup(&self, ctx: &SyncContext, user_id: &str) -> SyncResult<Integration> {
        ctx.guard("integration lookup", async {
            match self.store.get_integration(user_id, WHOOP).await {
                Err(e) if e.is_not_found() => Err(SyncError::not_found(user_id)),
                other => other.map_err(SyncError::from),
            }
        })
        .await
    }
}
