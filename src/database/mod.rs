// ABOUTME: SQLite persistence for integrations, encrypted tokens, raw events, and normalized records
// ABOUTME: Idempotent migrations and single-row upserts keyed by provider identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! `Database` is split across files by table group, each adding its own
//! `migrate_*` step and queries to the same `impl Database`. Every mutating
//! query touches a single integration's rows and resolves conflicts with
//! `ON CONFLICT ... DO UPDATE`, so concurrent runs for different integrations
//! never coordinate.

mod connections;
mod integrations;
mod raw_events;
mod records;
mod tokens;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use healthmetrics_core::errors::DatabaseError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Result alias for database operations
pub type DbResult<T> = Result<T, DatabaseError>;

/// Database manager for integration storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect and run migrations
    ///
    /// In-memory URLs get a single long-lived connection so every query sees
    /// the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails
    pub async fn new(database_url: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(query_err("parse database URL"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(query_err("connect"))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::MigrationError` naming the failed table
    pub async fn migrate(&self) -> DbResult<()> {
        self.migrate_integrations().await?;
        self.migrate_tokens().await?;
        self.migrate_connections().await?;
        self.migrate_raw_events().await?;
        self.migrate_records().await?;
        info!("database migrations complete");
        Ok(())
    }

    async fn execute_ddl(&self, table: &str, statement: &str) -> DbResult<()> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationError {
                context: format!("{table}: {e}"),
            })?;
        Ok(())
    }
}

/// Map a sqlx error into a `QueryError` naming the operation
pub(crate) fn query_err(operation: &'static str) -> impl Fn(sqlx::Error) -> DatabaseError {
    move |e| DatabaseError::query(format!("{operation}: {e}"))
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort chronologically
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .map_err(|e| DatabaseError::serialization(format!("{column} {value:?}: {e}")))
}

pub(crate) fn parse_date(column: &str, value: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| DatabaseError::serialization(format!("{column} {value:?}: {e}")))
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> DbResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| DatabaseError::serialization(format!("{column} {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_err_names_the_operation() {
        let error = query_err("get token")(sqlx::Error::RowNotFound);

        match error {
            DatabaseError::QueryError { context } => {
                assert!(context.starts_with("get token: "), "{context}");
            }
            other => panic!("expected QueryError, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_timestamp_accepts_sqlite_default_format() {
        let parsed = parse_timestamp("created_at", "2024-03-10 02:30:00").unwrap();
        assert_eq!(format_timestamp(parsed), "2024-03-10T02:30:00.000000Z");

        let error = parse_timestamp("created_at", "yesterday").unwrap_err();
        assert!(matches!(error, DatabaseError::Serialization { .. }));
    }
}
