// ABOUTME: Command-line entry point for WHOOP credential exchange, sync, and disconnect
// ABOUTME: Loads environment configuration, runs migrations, and prints reports as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Usage:
//! ```bash
//! # Connect a user after the OAuth redirect
//! cargo run --bin healthmetrics-sync -- exchange --user u1 --code abc --redirect-uri https://app/cb
//!
//! # Sync one user
//! cargo run --bin healthmetrics-sync -- sync --user u1
//!
//! # Sync every connected integration
//! cargo run --bin healthmetrics-sync -- sync-all
//!
//! # Disconnect a user
//! cargo run --bin healthmetrics-sync -- disconnect --user u1
//! ```

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use healthmetrics_providers::{initialize_shared_client, ReqwestTransport};
use healthmetrics_sync::clock::SystemClock;
use healthmetrics_sync::config::SyncConfig;
use healthmetrics_sync::context::SyncContext;
use healthmetrics_sync::database_plugins::SqliteStore;
use healthmetrics_sync::logging;
use healthmetrics_sync::metrics::SyncMetrics;
use healthmetrics_sync::sync::IntegrationService;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Connect timeout for the shared HTTP client
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Parser)]
#[command(
    name = "healthmetrics-sync",
    about = "HealthMetrics WHOOP integration sync",
    long_about = "Exchange WHOOP OAuth codes, sync WHOOP data into local storage, and disconnect integrations."
)]
struct SyncArgs {
    #[command(subcommand)]
    command: SyncCommand,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Correlation id for logs and reports (generated when omitted)
    #[arg(long)]
    correlation_id: Option<String>,
}

#[derive(Subcommand)]
enum SyncCommand {
    /// Exchange an authorization code and connect the user
    Exchange {
        /// Owning user id
        #[arg(long)]
        user: String,

        /// Authorization code from the OAuth redirect
        #[arg(long)]
        code: String,

        /// Redirect URI used for the authorization request
        #[arg(long)]
        redirect_uri: String,
    },

    /// Sync one user's WHOOP integration
    Sync {
        /// Owning user id
        #[arg(long)]
        user: String,
    },

    /// Sync every connected WHOOP integration
    SyncAll,

    /// Delete tokens and mark the user's integration disconnected
    Disconnect {
        /// Owning user id
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SyncArgs::parse();

    logging::init_from_env().map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let mut config = SyncConfig::from_env().map_err(|e| anyhow!("invalid configuration: {e}"))?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }

    initialize_shared_client(config.whoop.api_timeout.as_secs(), CONNECT_TIMEOUT_SECS);

    info!("Connecting to database: {}", config.database_url);
    let store = SqliteStore::new(&config.database_url)
        .await
        .map_err(|e| anyhow!("failed to open database: {e}"))?;

    let metrics = Arc::new(SyncMetrics::new());
    let service = IntegrationService::new(
        &config,
        Arc::new(store),
        Arc::new(ReqwestTransport::shared()),
        Arc::new(SystemClock),
        Arc::clone(&metrics),
    )?;

    let ctx = match args.correlation_id {
        Some(id) => SyncContext::new(id, config.run_deadline),
        None => SyncContext::generate(config.run_deadline),
    };

    match args.command {
        SyncCommand::Exchange {
            user,
            code,
            redirect_uri,
        } => {
            let integration_id = service
                .exchange_credentials(&ctx, &user, &code, &redirect_uri)
                .await?;
            print_json(&json!({ "integration_id": integration_id, "status": "connected" }))?;
        }
        SyncCommand::Sync { user } => {
            let report = service.sync_user(&ctx, &user).await?;
            print_json(&json!({ "report": report, "metrics": metrics.snapshot() }))?;
        }
        SyncCommand::SyncAll => {
            let outcomes = service.sync_all_connected(&ctx).await?;
            print_json(&json!({ "outcomes": outcomes, "metrics": metrics.snapshot() }))?;
        }
        SyncCommand::Disconnect { user } => {
            service.disconnect(&ctx, &user).await?;
            print_json(&json!({ "user_id": user, "status": "disconnected" }))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
