// ABOUTME: Structured error types for remote provider calls
// ABOUTME: Separates unauthorized, status, timeout, transport, and decode failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Remote provider call failures
///
/// The classification feeds logging and metrics. The fetcher itself never
/// retries on any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider answered HTTP 401
    #[error("{provider} rejected the access token (401)")]
    Unauthorized {
        /// Provider name
        provider: String,
    },

    /// Provider answered with any other 4xx/5xx status
    #[error("{provider} returned status {status_code}: {message}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status code
        status_code: u16,
        /// Response body excerpt
        message: String,
    },

    /// Request exceeded its deadline
    #[error("{provider} request timed out after {timeout_secs}s")]
    Timeout {
        /// Provider name
        provider: String,
        /// Deadline that was exceeded
        timeout_secs: u64,
    },

    /// Connection-level failure before a status was received
    #[error("{provider} transport failure: {message}")]
    Transport {
        /// Provider name
        provider: String,
        /// Underlying error text
        message: String,
    },

    /// Response body could not be decoded
    #[error("{provider} response could not be decoded: {message}")]
    Parse {
        /// Provider name
        provider: String,
        /// Decoder error text
        message: String,
    },

    /// A mandatory field was missing from an otherwise valid response
    #[error("{provider} response is missing {field}")]
    MissingField {
        /// Provider name
        provider: String,
        /// Field that was expected
        field: &'static str,
    },
}

impl ProviderError {
    /// Create an unauthorized error
    #[must_use]
    pub fn unauthorized(provider: impl Into<String>) -> Self {
        Self::Unauthorized {
            provider: provider.into(),
        }
    }

    /// Create an API status error
    #[must_use]
    pub fn api(provider: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(provider: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout_secs,
        }
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    #[must_use]
    pub fn parse(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a missing-field error
    #[must_use]
    pub fn missing_field(provider: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            provider: provider.into(),
            field,
        }
    }

    /// Whether the provider rejected the credential
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether the request hit its deadline
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
