// ABOUTME: Integration row operations: upsert per (user, provider), status flips, last sync time
// ABOUTME: Rows are never deleted here; disconnect only changes status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_timestamp, parse_timestamp, parse_uuid, query_err, Database, DbResult};
use chrono::{DateTime, Utc};
use healthmetrics_core::errors::DatabaseError;
use healthmetrics_core::models::{ConnectedIntegration, Integration, IntegrationStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_integrations(&self) -> DbResult<()> {
        self.execute_ddl(
            "integrations",
            r"
            CREATE TABLE IF NOT EXISTS integrations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'disconnected'
                    CHECK (status IN ('connected', 'disconnected')),
                last_sync_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, provider)
            )
            ",
        )
        .await?;

        self.execute_ddl(
            "integrations",
            "CREATE INDEX IF NOT EXISTS idx_integrations_provider_status ON integrations(provider, status)",
        )
        .await
    }

    /// Create the integration row if missing and return its id
    ///
    /// New rows start disconnected. An existing row keeps its id and status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_integration(&self, user_id: &str, provider: &str) -> DbResult<Uuid> {
        let now = format_timestamp(Utc::now());
        let row = sqlx::query(
            r"
            INSERT INTO integrations (id, user_id, provider, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'disconnected', ?4, ?4)
            ON CONFLICT(user_id, provider) DO UPDATE SET updated_at = excluded.updated_at
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(provider)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(query_err("upsert integration"))?;

        let id: String = row.try_get("id").map_err(query_err("read integration id"))?;
        parse_uuid("integrations.id", &id)
    }

    /// Look up the integration for a user and provider
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no row exists
    pub async fn get_integration(&self, user_id: &str, provider: &str) -> DbResult<Integration> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, provider, status, last_sync_at
            FROM integrations
            WHERE user_id = ?1 AND provider = ?2
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err("get integration"))?
        .ok_or_else(|| DatabaseError::not_found("integration", format!("{user_id}/{provider}")))?;

        row_to_integration(&row)
    }

    /// Set the connection status
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the integration does not exist
    pub async fn set_integration_status(&self, integration_id: Uuid, status: IntegrationStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE integrations SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(integration_id.to_string())
            .bind(status.as_str())
            .bind(format_timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(query_err("set integration status"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("integration", integration_id.to_string()));
        }
        Ok(())
    }

    /// Record the completion time of a successful sync
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the integration does not exist
    pub async fn update_last_sync(&self, integration_id: Uuid, synced_at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE integrations SET last_sync_at = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(integration_id.to_string())
        .bind(format_timestamp(synced_at))
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("update last sync"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("integration", integration_id.to_string()));
        }
        Ok(())
    }

    /// Connected integrations for a provider, oldest sync first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_connected_integrations(&self, provider: &str) -> DbResult<Vec<ConnectedIntegration>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id
            FROM integrations
            WHERE provider = ?1 AND status = 'connected'
            ORDER BY COALESCE(last_sync_at, '') ASC, id ASC
            ",
        )
        .bind(provider)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err("list connected integrations"))?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(query_err("read integration id"))?;
                Ok(ConnectedIntegration {
                    id: parse_uuid("integrations.id", &id)?,
                    user_id: row.try_get("user_id").map_err(query_err("read user id"))?,
                })
            })
            .collect()
    }
}

fn row_to_integration(row: &SqliteRow) -> DbResult<Integration> {
    let id: String = row.try_get("id").map_err(query_err("read integration id"))?;
    let status: String = row.try_get("status").map_err(query_err("read status"))?;
    let last_sync_at: Option<String> = row
        .try_get("last_sync_at")
        .map_err(query_err("read last_sync_at"))?;

    Ok(Integration {
        id: parse_uuid("integrations.id", &id)?,
        user_id: row.try_get("user_id").map_err(query_err("read user id"))?,
        provider: row.try_get("provider").map_err(query_err("read provider"))?,
        status: IntegrationStatus::from_str_or_default(&status),
        last_sync_at: last_sync_at
            .as_deref()
            .map(|v| parse_timestamp("integrations.last_sync_at", v))
            .transpose()?,
    })
}
