// ABOUTME: WHOOP OAuth2 token endpoint client for code exchange and token refresh
// ABOUTME: Posts form-encoded grants and validates that an access token came back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{check_status, transport_failure};
use crate::http_client::{HttpRequest, HttpTransport};
use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::errors::ProviderError;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Registered application credentials
#[derive(Clone)]
pub struct OAuthCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Validated token endpoint response
#[derive(Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// New access token, always present
    pub access_token: String,
    /// New refresh token, if the provider rotated it
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    pub expires_in: i64,
    /// Space-separated scope string, if returned
    pub scope: Option<String>,
    /// Token type, normally `bearer`
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Granted scopes split on whitespace, `None` when the provider sent no scope
    #[must_use]
    pub fn scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_owned).collect())
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Client for the WHOOP token endpoint
#[derive(Clone)]
pub struct WhoopOAuthClient {
    transport: Arc<dyn HttpTransport>,
    credentials: OAuthCredentials,
    token_url: String,
    timeout: Duration,
}

impl WhoopOAuthClient {
    /// Create a token client with its own request deadline
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: OAuthCredentials,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            token_url: token_url.into(),
            timeout,
        }
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`], or `MissingField` when the
    /// response carries no access token.
    #[instrument(skip(self, code), fields(provider = WHOOP, grant = "authorization_code"))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse, ProviderError> {
        self.post_grant(vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Exchange a refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`], or `MissingField` when the
    /// response carries no access token.
    #[instrument(skip(self, refresh_token), fields(provider = WHOOP, grant = "refresh_token"))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ProviderError> {
        info!("Refreshing WHOOP access token");
        self.post_grant(vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn post_grant(&self, grant: Vec<(&str, &str)>) -> Result<TokenResponse, ProviderError> {
        let mut form: Vec<(String, String)> = grant
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        form.push(("client_id".to_owned(), self.credentials.client_id.clone()));
        form.push((
            "client_secret".to_owned(),
            self.credentials.client_secret.clone(),
        ));

        let request = HttpRequest::post_form(&self.token_url, form, self.timeout)
            .header("Accept", "application/json");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| transport_failure(e, self.timeout))?;
        let body = check_status(response)?;

        let raw: RawTokenResponse =
            serde_json::from_slice(&body).map_err(|e| ProviderError::parse(WHOOP, e.to_string()))?;

        let access_token = raw
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::missing_field(WHOOP, "access_token"))?;

        Ok(TokenResponse {
            access_token,
            refresh_token: raw.refresh_token.filter(|t| !t.is_empty()),
            expires_in: raw.expires_in.unwrap_or(0),
            scope: raw.scope,
            token_type: raw.token_type,
        })
    }
}
