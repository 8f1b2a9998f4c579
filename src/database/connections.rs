// ABOUTME: Integration side record holding the provider user id and last sync error
// ABOUTME: Both fields are upserted independently so neither write clobbers the other
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_timestamp, parse_timestamp, parse_uuid, query_err, Database, DbResult};
use chrono::Utc;
use healthmetrics_core::models::IntegrationConnection;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_connections(&self) -> DbResult<()> {
        self.execute_ddl(
            "integration_connections",
            r"
            CREATE TABLE IF NOT EXISTS integration_connections (
                integration_id TEXT PRIMARY KEY REFERENCES integrations(id) ON DELETE CASCADE,
                provider_user_id TEXT,
                last_error TEXT,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    /// Set or clear the last sync error
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_last_error(&self, integration_id: Uuid, message: Option<&str>) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_connections (integration_id, last_error, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(integration_id) DO UPDATE SET
                last_error = excluded.last_error,
                updated_at = excluded.updated_at
            ",
        )
        .bind(integration_id.to_string())
        .bind(message)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert last error"))?;
        Ok(())
    }

    /// Record the provider's own user id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_provider_user_id(&self, integration_id: Uuid, provider_user_id: &str) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_connections (integration_id, provider_user_id, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(integration_id) DO UPDATE SET
                provider_user_id = excluded.provider_user_id,
                updated_at = excluded.updated_at
            ",
        )
        .bind(integration_id.to_string())
        .bind(provider_user_id)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert provider user id"))?;
        Ok(())
    }

    /// Read the side record, if one was ever written
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_connection(&self, integration_id: Uuid) -> DbResult<Option<IntegrationConnection>> {
        let Some(row) = sqlx::query(
            r"
            SELECT integration_id, provider_user_id, last_error, updated_at
            FROM integration_connections
            WHERE integration_id = ?1
            ",
        )
        .bind(integration_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err("get connection"))?
        else {
            return Ok(None);
        };

        let id: String = row.try_get("integration_id").map_err(query_err("read integration id"))?;
        let updated_at: String = row.try_get("updated_at").map_err(query_err("read updated_at"))?;

        Ok(Some(IntegrationConnection {
            integration_id: parse_uuid("integration_connections.integration_id", &id)?,
            provider_user_id: row
                .try_get("provider_user_id")
                .map_err(query_err("read provider user id"))?,
            last_error: row.try_get("last_error").map_err(query_err("read last error"))?,
            updated_at: parse_timestamp("integration_connections.updated_at", &updated_at)?,
        }))
    }
}
