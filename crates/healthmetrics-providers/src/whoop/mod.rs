// ABOUTME: WHOOP provider module with OAuth client, REST fetcher, and normalizer
// ABOUTME: Shared response classification for WHOOP token and data endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Paginated and single-object data retrieval
pub mod api_client;
/// Endpoint paths, default URLs, and page limits
pub mod constants;
/// Raw payload to typed record mapping
pub mod normalizer;
/// Authorization-code and refresh-token exchange
pub mod oauth;

pub use api_client::{CollectionCursor, CollectionPage, WhoopApiClient};
pub use normalizer::normalize;
pub use oauth::{OAuthCredentials, TokenResponse, WhoopOAuthClient};

use crate::http_client::{HttpResponse, TransportError};
use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::errors::ProviderError;
use std::time::Duration;
use tracing::warn;

/// Longest body excerpt carried into an error message
const ERROR_BODY_EXCERPT_CHARS: usize = 200;

/// Turn a transport failure into a provider error
pub(crate) fn transport_failure(error: TransportError, timeout: Duration) -> ProviderError {
    match error {
        TransportError::Timeout => ProviderError::timeout(WHOOP, timeout.as_secs()),
        TransportError::Connection(message) => ProviderError::transport(WHOOP, message),
    }
}

/// Classify a non-2xx response, or hand back the body on success
pub(crate) fn check_status(response: HttpResponse) -> Result<Vec<u8>, ProviderError> {
    if response.is_success() {
        return Ok(response.body);
    }

    let status = response.status;
    warn!(
        provider = WHOOP,
        status,
        body_length = response.body.len(),
        "WHOOP request failed"
    );

    if status == 401 {
        return Err(ProviderError::unauthorized(WHOOP));
    }

    let excerpt: String = response
        .body_text()
        .chars()
        .take(ERROR_BODY_EXCERPT_CHARS)
        .collect();
    Err(ProviderError::api(WHOOP, status, excerpt))
}
