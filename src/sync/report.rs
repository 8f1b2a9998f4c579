// ABOUTME: Serializable summaries of sync runs for callers, logs, and the CLI
// ABOUTME: Per-resource counters plus refresh flag and wall-clock duration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use healthmetrics_core::errors::{ErrorCode, SyncError};
use healthmetrics_core::models::ResourceType;
use serde::Serialize;
use uuid::Uuid;

/// Counters for one resource kind within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    /// Resource kind
    pub resource: ResourceType,
    /// Upstream requests that returned data
    pub pages_fetched: usize,
    /// Raw payloads written
    pub raw_events_stored: usize,
    /// Typed records written
    pub records_normalized: usize,
    /// Records dropped for missing id or unusable instants
    pub records_skipped: usize,
}

impl ResourceReport {
    pub(crate) const fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            pages_fetched: 0,
            raw_events_stored: 0,
            records_normalized: 0,
            records_skipped: 0,
        }
    }
}

/// Result of a successful sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Integration that was synced
    pub integration_id: Uuid,
    /// Correlation id of the run
    pub correlation_id: String,
    /// Whether the access token was refreshed before fetching
    pub refreshed: bool,
    /// Counters in fetch order
    pub resources: Vec<ResourceReport>,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl SyncReport {
    /// Counters for one resource kind
    #[must_use]
    pub fn resource(&self, resource: ResourceType) -> Option<&ResourceReport> {
        self.resources.iter().find(|r| r.resource == resource)
    }

    /// Raw payloads written across all resources
    #[must_use]
    pub fn total_raw_events(&self) -> usize {
        self.resources.iter().map(|r| r.raw_events_stored).sum()
    }

    /// Typed records written across all resources
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.resources.iter().map(|r| r.records_normalized).sum()
    }
}

/// Per-integration result of a scheduler sweep
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Integration that was attempted
    pub integration_id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Report on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
    /// Error code on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub(crate) fn from_result(integration_id: Uuid, user_id: String, result: Result<SyncReport, SyncError>) -> Self {
        match result {
            Ok(report) => Self {
                integration_id,
                user_id,
                report: Some(report),
                error_code: None,
                error: None,
            },
            Err(e) => Self {
                integration_id,
                user_id,
                report: None,
                error_code: Some(e.code()),
                error: Some(e.to_string()),
            },
        }
    }

    /// Whether the run succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.report.is_some()
    }
}
