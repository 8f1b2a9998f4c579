// ABOUTME: WHOOP REST fetcher for single-object and paginated collection endpoints
// ABOUTME: Collections stop on an empty next_token and never exceed MAX_PAGES requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::constants::{endpoint_path, MAX_PAGES, PAGE_LIMIT};
use super::{check_status, transport_failure};
use crate::http_client::{HttpRequest, HttpTransport};
use healthmetrics_core::constants::providers::WHOOP;
use healthmetrics_core::errors::ProviderError;
use healthmetrics_core::models::ResourceType;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Raw JSON object as returned by the provider
pub type RawRecord = Map<String, Value>;

#[derive(Deserialize)]
struct CollectionEnvelope {
    #[serde(default)]
    records: Vec<RawRecord>,
    #[serde(default)]
    next_token: Option<String>,
}

/// One page of a collection endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    /// Records on this page
    pub records: Vec<RawRecord>,
    /// Continuation token, `None` when the provider sent none or an empty one
    pub next_token: Option<String>,
}

/// Bearer-authenticated client for the WHOOP developer API
///
/// Performs no retries. Every error aborts the current resource and is
/// returned to the caller for classification.
#[derive(Clone)]
pub struct WhoopApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
}

impl WhoopApiClient {
    /// Create a client against `base_url` with a per-request `timeout`
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout,
        }
    }

    fn build_url(&self, resource: ResourceType, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let raw = format!("{}{}", self.base_url, endpoint_path(resource));
        let mut url = Url::parse(&raw)
            .map_err(|e| ProviderError::transport(WHOOP, format!("invalid URL {raw}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }

    async fn get(&self, access_token: &str, url: String) -> Result<Vec<u8>, ProviderError> {
        let request = HttpRequest::get(url, self.timeout)
            .header("Authorization", format!("Bearer {access_token}"))
            .header("Accept", "application/json");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| transport_failure(e, self.timeout))?;

        check_status(response)
    }

    /// Fetch a single-object resource as an open attribute map
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`] on transport, status, or decode failure.
    #[instrument(skip(self, access_token), fields(provider = WHOOP, resource = %resource))]
    pub async fn fetch_object(&self, access_token: &str, resource: ResourceType) -> Result<RawRecord, ProviderError> {
        let url = self.build_url(resource, &[])?;
        let body = self.get(access_token, url).await?;

        serde_json::from_slice(&body).map_err(|e| ProviderError::parse(WHOOP, e.to_string()))
    }

    /// Fetch one page of a collection
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`] on transport, status, or decode failure.
    #[instrument(skip(self, access_token, next_token), fields(provider = WHOOP, resource = %resource))]
    pub async fn fetch_page(
        &self,
        access_token: &str,
        resource: ResourceType,
        next_token: Option<&str>,
    ) -> Result<CollectionPage, ProviderError> {
        let limit = PAGE_LIMIT.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(token) = next_token {
            query.push(("next_token", token));
        }

        let url = self.build_url(resource, &query)?;
        let body = self.get(access_token, url).await?;

        let envelope: CollectionEnvelope =
            serde_json::from_slice(&body).map_err(|e| ProviderError::parse(WHOOP, e.to_string()))?;

        debug!(records = envelope.records.len(), "fetched WHOOP page");

        Ok(CollectionPage {
            records: envelope.records,
            next_token: envelope.next_token.filter(|t| !t.is_empty()),
        })
    }

    /// Start walking a collection from its first page
    #[must_use]
    pub fn collection<'a>(&'a self, access_token: &'a str, resource: ResourceType) -> CollectionCursor<'a> {
        CollectionCursor {
            client: self,
            access_token,
            resource,
            next_token: None,
            pages_fetched: 0,
            exhausted: false,
        }
    }
}

/// Page-by-page walk over one collection
///
/// Yields at most [`MAX_PAGES`] pages. The cap bounds sync cost and says
/// nothing about completeness.
pub struct CollectionCursor<'a> {
    client: &'a WhoopApiClient,
    access_token: &'a str,
    resource: ResourceType,
    next_token: Option<String>,
    pages_fetched: usize,
    exhausted: bool,
}

impl CollectionCursor<'_> {
    /// Fetch the next page, or `None` once the walk is over
    ///
    /// # Errors
    ///
    /// Returns the page request's [`ProviderError`]. The cursor is left
    /// exhausted so a caller that keeps polling gets `None`.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RawRecord>>, ProviderError> {
        if self.exhausted || self.pages_fetched >= MAX_PAGES {
            return Ok(None);
        }

        let page = match self
            .client
            .fetch_page(self.access_token, self.resource, self.next_token.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        match page.next_token {
            Some(token) => self.next_token = Some(token),
            None => self.exhausted = true,
        }

        Ok(Some(page.records))
    }

    /// Number of page requests that succeeded so far
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Resource being walked
    #[must_use]
    pub const fn resource(&self) -> ResourceType {
        self.resource
    }
}
