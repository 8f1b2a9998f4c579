// ABOUTME: Verbatim provider payload archive keyed by (integration, resource type, source id)
// ABOUTME: A later fetch of the same source id overwrites the payload instead of adding a row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_timestamp, query_err, Database, DbResult};
use chrono::Utc;
use healthmetrics_core::errors::DatabaseError;
use healthmetrics_core::models::ResourceType;
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_raw_events(&self) -> DbResult<()> {
        self.execute_ddl(
            "integration_raw_events",
            r"
            CREATE TABLE IF NOT EXISTS integration_raw_events (
                id TEXT PRIMARY KEY,
                integration_id TEXT NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
                resource_type TEXT NOT NULL,
                source_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                UNIQUE(integration_id, resource_type, source_id)
            )
            ",
        )
        .await
    }

    /// Archive a raw payload, replacing any earlier copy
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_raw_event(
        &self,
        integration_id: Uuid,
        resource_type: ResourceType,
        source_id: &str,
        payload: &Value,
    ) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_raw_events (
                id, integration_id, resource_type, source_id, payload, fetched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(integration_id, resource_type, source_id) DO UPDATE SET
                payload = excluded.payload,
                fetched_at = excluded.fetched_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(integration_id.to_string())
        .bind(resource_type.as_str())
        .bind(source_id)
        .bind(payload.to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert raw event"))?;
        Ok(())
    }

    /// Read one archived payload
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the payload is not valid JSON
    pub async fn get_raw_event(
        &self,
        integration_id: Uuid,
        resource_type: ResourceType,
        source_id: &str,
    ) -> DbResult<Option<Value>> {
        let row = sqlx::query(
            r"
            SELECT payload FROM integration_raw_events
            WHERE integration_id = ?1 AND resource_type = ?2 AND source_id = ?3
            ",
        )
        .bind(integration_id.to_string())
        .bind(resource_type.as_str())
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err("get raw event"))?;

        row.map(|r| {
            let payload: String = r.try_get("payload").map_err(query_err("read payload"))?;
            serde_json::from_str(&payload)
                .map_err(|e| DatabaseError::serialization(format!("raw event payload: {e}")))
        })
        .transpose()
    }

    /// Number of archived payloads for an integration
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_raw_events(&self, integration_id: Uuid) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM integration_raw_events WHERE integration_id = ?1")
            .bind(integration_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(query_err("count raw events"))?;
        row.try_get("n").map_err(query_err("read raw event count"))
    }
}
