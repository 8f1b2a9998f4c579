// ABOUTME: Encrypted OAuth token storage, at most one row per integration
// ABOUTME: Upserts replace the whole row; scopes are stored as a JSON array
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_timestamp, parse_timestamp, query_err, Database, DbResult};
use chrono::Utc;
use healthmetrics_core::errors::DatabaseError;
use healthmetrics_core::models::StoredToken;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_tokens(&self) -> DbResult<()> {
        self.execute_ddl(
            "integration_tokens",
            r"
            CREATE TABLE IF NOT EXISTS integration_tokens (
                integration_id TEXT PRIMARY KEY REFERENCES integrations(id) ON DELETE CASCADE,
                access_token_encrypted TEXT NOT NULL,
                refresh_token_encrypted TEXT,
                expires_at TEXT,
                scopes TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    /// Store or replace the token row for an integration
    ///
    /// # Errors
    ///
    /// Returns an error if scopes cannot be encoded or the query fails
    pub async fn upsert_token(&self, integration_id: Uuid, token: &StoredToken) -> DbResult<()> {
        let scopes = serde_json::to_string(&token.scopes)
            .map_err(|e| DatabaseError::serialization(format!("scopes: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO integration_tokens (
                integration_id, access_token_encrypted, refresh_token_encrypted,
                expires_at, scopes, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(integration_id) DO UPDATE SET
                access_token_encrypted = excluded.access_token_encrypted,
                refresh_token_encrypted = excluded.refresh_token_encrypted,
                expires_at = excluded.expires_at,
                scopes = excluded.scopes,
                updated_at = excluded.updated_at
            ",
        )
        .bind(integration_id.to_string())
        .bind(&token.access_token_encrypted)
        .bind(token.refresh_token_encrypted.as_deref())
        .bind(token.expires_at.map(format_timestamp))
        .bind(scopes)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert token"))?;

        Ok(())
    }

    /// Whether a token row exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn has_token(&self, integration_id: Uuid) -> DbResult<bool> {
        let row = sqlx::query("SELECT 1 FROM integration_tokens WHERE integration_id = ?1 LIMIT 1")
            .bind(integration_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err("check token"))?;
        Ok(row.is_some())
    }

    /// Load the token row
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no row exists
    pub async fn get_token(&self, integration_id: Uuid) -> DbResult<StoredToken> {
        let row = sqlx::query(
            r"
            SELECT access_token_encrypted, refresh_token_encrypted, expires_at, scopes
            FROM integration_tokens
            WHERE integration_id = ?1
            ",
        )
        .bind(integration_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err("get token"))?
        .ok_or_else(|| DatabaseError::not_found("integration token", integration_id.to_string()))?;

        let expires_at: Option<String> = row.try_get("expires_at").map_err(query_err("read expires_at"))?;
        let scopes: String = row.try_get("scopes").map_err(query_err("read scopes"))?;

        Ok(StoredToken {
            access_token_encrypted: row
                .try_get("access_token_encrypted")
                .map_err(query_err("read access token"))?,
            refresh_token_encrypted: row
                .try_get("refresh_token_encrypted")
                .map_err(query_err("read refresh token"))?,
            expires_at: expires_at
                .as_deref()
                .map(|v| parse_timestamp("integration_tokens.expires_at", v))
                .transpose()?,
            scopes: serde_json::from_str(&scopes)
                .map_err(|e| DatabaseError::serialization(format!("scopes: {e}")))?,
        })
    }

    /// Delete the token row, returning how many rows were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_tokens(&self, integration_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM integration_tokens WHERE integration_id = ?1")
            .bind(integration_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_err("delete tokens"))?;
        Ok(result.rows_affected())
    }
}
