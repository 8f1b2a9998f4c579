// ABOUTME: Main library entry point for the HealthMetrics WHOOP sync engine
// ABOUTME: Credential vault, token lifecycle, bounded fetching, normalization, and idempotent storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # HealthMetrics Sync
//!
//! Keeps a user's WHOOP data mirrored into local storage. The engine owns the
//! OAuth credential lifecycle, walks WHOOP's paginated REST endpoints, and
//! turns open JSON payloads into typed, idempotently upserted records.
//!
//! ## Architecture
//!
//! - **Crypto**: AES-256-GCM vault for stored OAuth tokens
//! - **Sync**: token manager, run orchestrator, and the `IntegrationService`
//!   entry points used by handlers and schedulers
//! - **Database**: `SQLite` schema and queries behind the `IntegrationStore` trait
//! - **Providers** (`healthmetrics-providers`): HTTP transport, WHOOP OAuth
//!   client, fetcher, and normalizer
//! - **Core** (`healthmetrics-core`): error taxonomy and domain models
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use healthmetrics_sync::clock::SystemClock;
//! use healthmetrics_sync::config::SyncConfig;
//! use healthmetrics_sync::context::SyncContext;
//! use healthmetrics_sync::database_plugins::SqliteStore;
//! use healthmetrics_sync::metrics::SyncMetrics;
//! use healthmetrics_sync::sync::IntegrationService;
//! use healthmetrics_providers::ReqwestTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::from_env()?;
//!     let store = Arc::new(SqliteStore::new(&config.database_url).await?);
//!     let service = IntegrationService::new(
//!         &config,
//!         store,
//!         Arc::new(ReqwestTransport::shared()),
//!         Arc::new(SystemClock),
//!         Arc::new(SyncMetrics::new()),
//!     )?;
//!
//!     let ctx = SyncContext::generate(config.run_deadline);
//!     let report = service.sync_user(&ctx, "user-123").await?;
//!     println!("stored {} records", report.total_records());
//!     Ok(())
//! }
//! ```

/// Time source injected into token and sync bookkeeping
pub mod clock;

/// Environment configuration
pub mod config;

/// Per-run correlation id, deadline, and cancellation
pub mod context;

/// Token encryption
pub mod crypto;

/// `SQLite` schema and queries
pub mod database;

/// Persistence contract and its `SQLite` implementation
pub mod database_plugins;

/// Structured logging setup
pub mod logging;

/// In-memory operation counters
pub mod metrics;

/// Token lifecycle, orchestration, and service entry points
pub mod sync;

pub use healthmetrics_core::errors::{ErrorCode, SyncError, SyncResult};
pub use sync::{IntegrationService, SyncReport};
