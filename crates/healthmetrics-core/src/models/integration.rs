// ABOUTME: Integration connection models with status and encrypted token storage shape
// ABOUTME: One integration per (user, provider), at most one token row per integration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Connection status of an integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    /// Credentials are stored and syncs may run
    Connected,
    /// No credentials, or the user disconnected
    #[default]
    Disconnected,
}

impl IntegrationStatus {
    /// Column value for this status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }

    /// Parse a stored column value, treating unknown values as disconnected
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "connected" => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's connection to one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    /// Integration identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Provider name (see `constants::providers`)
    pub provider: String,
    /// Current connection status
    pub status: IntegrationStatus,
    /// Completion time of the last successful sync
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Integration {
    /// Whether syncs may run against this integration
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == IntegrationStatus::Connected
    }
}

/// Identity pair returned when listing connected integrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedIntegration {
    /// Integration identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
}

/// Encrypted OAuth credentials for one integration
///
/// Token fields hold vault ciphertext, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Encrypted access token
    pub access_token_encrypted: String,
    /// Encrypted refresh token, present only when the provider issued one
    pub refresh_token_encrypted: Option<String>,
    /// Access token expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes in the order the provider listed them
    pub scopes: Vec<String>,
}

/// Side record with provider identity and last sync failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConnection {
    /// Integration identifier
    pub integration_id: Uuid,
    /// The provider's own user id, once known
    pub provider_user_id: Option<String>,
    /// Most recent sync failure, cleared after a successful sync
    pub last_error: Option<String>,
    /// Last time this row changed
    pub updated_at: DateTime<Utc>,
}
