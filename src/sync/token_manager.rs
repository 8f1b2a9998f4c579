// ABOUTME: Token lifecycle for one integration: presence check, decrypt, expiry check, refresh
// ABOUTME: A refreshed token is persisted before any data fetch so a crash leaves it usable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::clock::Clock;
use crate::context::SyncContext;
use crate::crypto::TokenVault;
use crate::database_plugins::IntegrationStore;
use crate::metrics::SyncMetrics;
use chrono::{DateTime, Duration, Utc};
use healthmetrics_core::constants::tokens::REFRESH_MARGIN_SECS;
use healthmetrics_core::errors::{SyncError, SyncResult};
use healthmetrics_core::models::StoredToken;
use healthmetrics_providers::whoop::{TokenResponse, WhoopOAuthClient};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Upper bound applied to provider-reported `expires_in`
pub(super) const MAX_EXPIRES_IN_SECS: i64 = 60 * 60 * 24 * 365;

/// Where a stored credential sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token row exists
    NoToken,
    /// Expiry is beyond the refresh margin, or unknown
    Valid,
    /// Expiry falls within the refresh margin or has passed
    ExpiringSoon,
}

impl TokenState {
    /// Classify a token row against `now`
    #[must_use]
    pub fn classify(token: Option<&StoredToken>, now: DateTime<Utc>) -> Self {
        let Some(token) = token else {
            return Self::NoToken;
        };
        match token.expires_at {
            Some(expires_at) if expires_at <= now + Duration::seconds(REFRESH_MARGIN_SECS) => {
                Self::ExpiringSoon
            }
            _ => Self::Valid,
        }
    }
}

/// Usable plaintext access token for the current run
#[derive(Clone)]
pub struct AccessGrant {
    /// Bearer token for data requests
    pub access_token: String,
    /// Whether a refresh exchange produced it
    pub refreshed: bool,
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("access_token", &"[REDACTED]")
            .field("refreshed", &self.refreshed)
            .finish()
    }
}

/// Drives the token state machine for sync runs
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn IntegrationStore>,
    vault: Arc<TokenVault>,
    oauth: Arc<WhoopOAuthClient>,
    clock: Arc<dyn Clock>,
    metrics: Arc<SyncMetrics>,
}

impl TokenManager {
    /// Create a manager over injected collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn IntegrationStore>,
        vault: Arc<TokenVault>,
        oauth: Arc<WhoopOAuthClient>,
        clock: Arc<dyn Clock>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            store,
            vault,
            oauth,
            clock,
            metrics,
        }
    }

    /// Produce an access token that will outlive the refresh margin
    ///
    /// # Errors
    ///
    /// - `MissingToken` when no token row exists, or the token is expiring and
    ///   no refresh token is stored. No network call is made in either case.
    /// - `DecryptionFailed` when stored ciphertext does not authenticate
    /// - Upstream errors from the refresh exchange
    /// - `Persistence` when the refreshed token cannot be stored
    #[instrument(
        skip(self, ctx),
        fields(provider = "whoop", correlation_id = %ctx.correlation_id())
    )]
    pub async fn ensure_access_token(&self, ctx: &SyncContext, integration_id: Uuid) -> SyncResult<AccessGrant> {
        if !ctx.guard("token lookup", self.store.has_token(integration_id)).await? {
            debug!("no token row");
            return Err(SyncError::MissingToken);
        }

        let token = ctx
            .guard("token lookup", async {
                match self.store.get_token(integration_id).await {
                    Err(e) if e.is_not_found() => Err(SyncError::MissingToken),
                    other => other.map_err(SyncError::from),
                }
            })
            .await?;

        match TokenState::classify(Some(&token), self.clock.now()) {
            TokenState::NoToken => Err(SyncError::MissingToken),
            TokenState::Valid => {
                let access_token = self
                    .vault
                    .decrypt(&token.access_token_encrypted)
                    .map_err(|e| SyncError::from(e).context("token decrypt"))?;
                Ok(AccessGrant {
                    access_token,
                    refreshed: false,
                })
            }
            TokenState::ExpiringSoon => self.refresh(ctx, integration_id, token).await,
        }
    }

    async fn refresh(&self, ctx: &SyncContext, integration_id: Uuid, current: StoredToken) -> SyncResult<AccessGrant> {
        let Some(refresh_cipher) = current.refresh_token_encrypted.as_deref() else {
            warn!(%integration_id, "token expiring and no refresh token stored");
            return Err(SyncError::MissingToken);
        };

        let refresh_token = self
            .vault
            .decrypt(refresh_cipher)
            .map_err(|e| SyncError::from(e).context("token decrypt"))?;

        let response = ctx
            .guard("token refresh", self.oauth.refresh(&refresh_token))
            .await;
        self.metrics.record_refresh(response.is_ok());
        let response = response?;

        let stored = self
            .reseal(&response, &current)
            .map_err(|e| e.context("token encrypt"))?;
        ctx.guard("token store", self.store.upsert_token(integration_id, &stored))
            .await?;

        info!(%integration_id, expires_in = response.expires_in, "refreshed WHOOP access token");
        Ok(AccessGrant {
            access_token: response.access_token,
            refreshed: true,
        })
    }

    /// Encrypt a refresh response, keeping the prior refresh token and scopes when omitted
    fn reseal(&self, response: &TokenResponse, current: &StoredToken) -> SyncResult<StoredToken> {
        let refresh_token_encrypted = match response.refresh_token.as_deref() {
            Some(refresh) => Some(self.vault.encrypt(refresh)?),
            None => current.refresh_token_encrypted.clone(),
        };

        Ok(StoredToken {
            access_token_encrypted: self.vault.encrypt(&response.access_token)?,
            refresh_token_encrypted,
            expires_at: Some(
                self.clock.now() + Duration::seconds(response.expires_in.clamp(0, MAX_EXPIRES_IN_SECS)),
            ),
            scopes: response.scopes().unwrap_or_else(|| current.scopes.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(expires_at: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            access_token_encrypted: "cipher".to_owned(),
            refresh_token_encrypted: None,
            expires_at,
            scopes: Vec::new(),
        }
    }

    #[test]
    fn test_classify_states() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(TokenState::classify(None, now), TokenState::NoToken);
        assert_eq!(
            TokenState::classify(Some(&token(None)), now),
            TokenState::Valid
        );
        assert_eq!(
            TokenState::classify(Some(&token(Some(now + Duration::minutes(10)))), now),
            TokenState::Valid
        );
        assert_eq!(
            TokenState::classify(Some(&token(Some(now + Duration::seconds(30)))), now),
            TokenState::ExpiringSoon
        );
        assert_eq!(
            TokenState::classify(Some(&token(Some(now - Duration::minutes(1)))), now),
            TokenState::ExpiringSoon
        );
    }

    #[test]
    fn test_margin_boundary_is_expiring() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let at_margin = token(Some(now + Duration::seconds(REFRESH_MARGIN_SECS)));
        assert_eq!(
            TokenState::classify(Some(&at_margin), now),
            TokenState::ExpiringSoon
        );
    }
}
