// ABOUTME: Normalized sleep, recovery, workout, and cycle tables with idempotent upserts
// ABOUTME: Primary-sleep pass marks the longest session per (integration, local date)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{format_timestamp, parse_date, parse_timestamp, parse_uuid, query_err, Database, DbResult};
use chrono::{NaiveDate, Utc};
use healthmetrics_core::errors::DatabaseError;
use healthmetrics_core::models::{
    CycleRecord, NormalizedRecord, RecoveryRecord, ResourceType, SleepRecord, WorkoutRecord,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Table holding normalized rows for a resource kind
const fn normalized_table(resource: ResourceType) -> Option<&'static str> {
    match resource {
        ResourceType::Sleep => Some("integration_sleeps"),
        ResourceType::Recovery => Some("integration_recoveries"),
        ResourceType::Workout => Some("integration_workouts"),
        ResourceType::Cycle => Some("integration_cycles"),
        ResourceType::Profile | ResourceType::BodyMeasurement => None,
    }
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Database {
    pub(super) async fn migrate_records(&self) -> DbResult<()> {
        self.execute_ddl(
            "integration_sleeps",
            r"
            CREATE TABLE IF NOT EXISTS integration_sleeps (
                id TEXT PRIMARY KEY,
                integration_id TEXT NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
                external_id TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                local_date TEXT NOT NULL,
                source_tz_offset_minutes INTEGER NOT NULL DEFAULT 0,
                duration_seconds INTEGER NOT NULL,
                sleep_score INTEGER,
                is_nap INTEGER NOT NULL DEFAULT 0,
                is_primary INTEGER NOT NULL DEFAULT 0,
                extras TEXT,
                updated_at TEXT NOT NULL,
                UNIQUE(integration_id, external_id)
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "integration_sleeps",
            "CREATE INDEX IF NOT EXISTS idx_integration_sleeps_local_date ON integration_sleeps(integration_id, local_date)",
        )
        .await?;

        self.execute_ddl(
            "integration_recoveries",
            r"
            CREATE TABLE IF NOT EXISTS integration_recoveries (
                id TEXT PRIMARY KEY,
                integration_id TEXT NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
                external_id TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                local_date TEXT NOT NULL,
                source_tz_offset_minutes INTEGER NOT NULL DEFAULT 0,
                recovery_score INTEGER,
                hrv_rmssd_ms REAL,
                resting_hr_bpm INTEGER,
                spo2_pct REAL,
                extras TEXT,
                updated_at TEXT NOT NULL,
                UNIQUE(integration_id, external_id)
            )
            ",
        )
        .await?;

        self.execute_ddl(
            "integration_workouts",
            r"
            CREATE TABLE IF NOT EXISTS integration_workouts (
                id TEXT PRIMARY KEY,
                integration_id TEXT NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
                external_id TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                local_date TEXT NOT NULL,
                source_tz_offset_minutes INTEGER NOT NULL DEFAULT 0,
                sport_name TEXT,
                strain REAL,
                calories_kcal REAL,
                distance_km REAL,
                extras TEXT,
                updated_at TEXT NOT NULL,
                UNIQUE(integration_id, external_id)
            )
            ",
        )
        .await?;

        self.execute_ddl(
            "integration_cycles",
            r"
            CREATE TABLE IF NOT EXISTS integration_cycles (
                id TEXT PRIMARY KEY,
                integration_id TEXT NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
                external_id TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                local_date TEXT NOT NULL,
                source_tz_offset_minutes INTEGER NOT NULL DEFAULT 0,
                day_strain REAL,
                kilojoules REAL,
                avg_hr_bpm INTEGER,
                max_hr_bpm INTEGER,
                extras TEXT,
                updated_at TEXT NOT NULL,
                UNIQUE(integration_id, external_id)
            )
            ",
        )
        .await
    }

    /// Upsert a normalized record into its table
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_normalized(&self, record: &NormalizedRecord) -> DbResult<()> {
        match record {
            NormalizedRecord::Sleep(r) => self.upsert_sleep(r).await,
            NormalizedRecord::Recovery(r) => self.upsert_recovery(r).await,
            NormalizedRecord::Workout(r) => self.upsert_workout(r).await,
            NormalizedRecord::Cycle(r) => self.upsert_cycle(r).await,
        }
    }

    /// Upsert a sleep row
    ///
    /// `is_primary` is written on insert only; the primary-sleep pass owns it
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_sleep(&self, record: &SleepRecord) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_sleeps (
                id, integration_id, external_id, start_at, end_at, local_date,
                source_tz_offset_minutes, duration_seconds, sleep_score, is_nap,
                is_primary, extras, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(integration_id, external_id) DO UPDATE SET
                start_at = excluded.start_at,
                end_at = excluded.end_at,
                local_date = excluded.local_date,
                source_tz_offset_minutes = excluded.source_tz_offset_minutes,
                duration_seconds = excluded.duration_seconds,
                sleep_score = excluded.sleep_score,
                is_nap = excluded.is_nap,
                extras = excluded.extras,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.integration_id.to_string())
        .bind(&record.external_id)
        .bind(format_timestamp(record.start_at))
        .bind(format_timestamp(record.end_at))
        .bind(date_text(record.local_date))
        .bind(record.source_tz_offset_minutes)
        .bind(record.duration_seconds)
        .bind(record.sleep_score)
        .bind(record.is_nap)
        .bind(record.is_primary)
        .bind(record.extras.to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert sleep"))?;
        Ok(())
    }

    /// Upsert a recovery row
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_recovery(&self, record: &RecoveryRecord) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_recoveries (
                id, integration_id, external_id, recorded_at, local_date,
                source_tz_offset_minutes, recovery_score, hrv_rmssd_ms,
                resting_hr_bpm, spo2_pct, extras, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(integration_id, external_id) DO UPDATE SET
                recorded_at = excluded.recorded_at,
                local_date = excluded.local_date,
                source_tz_offset_minutes = excluded.source_tz_offset_minutes,
                recovery_score = excluded.recovery_score,
                hrv_rmssd_ms = excluded.hrv_rmssd_ms,
                resting_hr_bpm = excluded.resting_hr_bpm,
                spo2_pct = excluded.spo2_pct,
                extras = excluded.extras,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.integration_id.to_string())
        .bind(&record.external_id)
        .bind(format_timestamp(record.recorded_at))
        .bind(date_text(record.local_date))
        .bind(record.source_tz_offset_minutes)
        .bind(record.recovery_score)
        .bind(record.hrv_rmssd_ms)
        .bind(record.resting_hr_bpm)
        .bind(record.spo2_pct)
        .bind(record.extras.to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert recovery"))?;
        Ok(())
    }

    /// Upsert a workout row
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_workout(&self, record: &WorkoutRecord) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_workouts (
                id, integration_id, external_id, start_at, end_at, local_date,
                source_tz_offset_minutes, sport_name, strain, calories_kcal,
                distance_km, extras, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(integration_id, external_id) DO UPDATE SET
                start_at = excluded.start_at,
                end_at = excluded.end_at,
                local_date = excluded.local_date,
                source_tz_offset_minutes = excluded.source_tz_offset_minutes,
                sport_name = excluded.sport_name,
                strain = excluded.strain,
                calories_kcal = excluded.calories_kcal,
                distance_km = excluded.distance_km,
                extras = excluded.extras,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.integration_id.to_string())
        .bind(&record.external_id)
        .bind(format_timestamp(record.start_at))
        .bind(format_timestamp(record.end_at))
        .bind(date_text(record.local_date))
        .bind(record.source_tz_offset_minutes)
        .bind(record.sport_name.as_deref())
        .bind(record.strain)
        .bind(record.calories_kcal)
        .bind(record.distance_km)
        .bind(record.extras.to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert workout"))?;
        Ok(())
    }

    /// Upsert a cycle row
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn upsert_cycle(&self, record: &CycleRecord) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO integration_cycles (
                id, integration_id, external_id, start_at, end_at, local_date,
                source_tz_offset_minutes, day_strain, kilojoules, avg_hr_bpm,
                max_hr_bpm, extras, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(integration_id, external_id) DO UPDATE SET
                start_at = excluded.start_at,
                end_at = excluded.end_at,
                local_date = excluded.local_date,
                source_tz_offset_minutes = excluded.source_tz_offset_minutes,
                day_strain = excluded.day_strain,
                kilojoules = excluded.kilojoules,
                avg_hr_bpm = excluded.avg_hr_bpm,
                max_hr_bpm = excluded.max_hr_bpm,
                extras = excluded.extras,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.integration_id.to_string())
        .bind(&record.external_id)
        .bind(format_timestamp(record.start_at))
        .bind(format_timestamp(record.end_at))
        .bind(date_text(record.local_date))
        .bind(record.source_tz_offset_minutes)
        .bind(record.day_strain)
        .bind(record.kilojoules)
        .bind(record.avg_hr_bpm)
        .bind(record.max_hr_bpm)
        .bind(record.extras.to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(query_err("upsert cycle"))?;
        Ok(())
    }

    /// Mark the longest sleep of each local date as primary
    ///
    /// Ties on duration go to the earliest `start_at`, then the lowest
    /// `external_id`. Every other row in the partition is cleared. Returns the
    /// number of rows examined.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn select_primary_sleep(&self, integration_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r"
            WITH ranked AS (
                SELECT id,
                       ROW_NUMBER() OVER (
                           PARTITION BY integration_id, local_date
                           ORDER BY duration_seconds DESC, start_at ASC, external_id ASC
                       ) AS rn
                FROM integration_sleeps
                WHERE integration_id = ?1
            )
            UPDATE integration_sleeps
            SET is_primary = CASE
                WHEN id IN (SELECT id FROM ranked WHERE rn = 1) THEN 1
                ELSE 0
            END
            WHERE integration_id = ?1
            ",
        )
        .bind(integration_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(query_err("select primary sleep"))?;
        Ok(result.rows_affected())
    }

    /// Number of normalized rows of one kind for an integration
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::QueryError` for resource kinds without a table
    pub async fn count_records(&self, integration_id: Uuid, resource: ResourceType) -> DbResult<i64> {
        let table = normalized_table(resource)
            .ok_or_else(|| DatabaseError::query(format!("{resource} has no normalized table")))?;

        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS n FROM {table} WHERE integration_id = ?1"
        ))
        .bind(integration_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(query_err("count records"))?;
        row.try_get("n").map_err(query_err("read record count"))
    }

    /// Sleep rows for an integration ordered by local date then start
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn list_sleeps(&self, integration_id: Uuid) -> DbResult<Vec<SleepRecord>> {
        let rows = sqlx::query(
            r"
            SELECT integration_id, external_id, start_at, end_at, local_date,
                   source_tz_offset_minutes, duration_seconds, sleep_score,
                   is_nap, is_primary, extras
            FROM integration_sleeps
            WHERE integration_id = ?1
            ORDER BY local_date ASC, start_at ASC
            ",
        )
        .bind(integration_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_err("list sleeps"))?;

        rows.iter().map(row_to_sleep).collect()
    }
}

fn row_to_sleep(row: &SqliteRow) -> DbResult<SleepRecord> {
    let text = |column: &'static str| -> DbResult<String> {
        row.try_get(column).map_err(query_err("read sleep column"))
    };
    let extras: Option<String> = row.try_get("extras").map_err(query_err("read extras"))?;

    Ok(SleepRecord {
        integration_id: parse_uuid("integration_sleeps.integration_id", &text("integration_id")?)?,
        external_id: text("external_id")?,
        start_at: parse_timestamp("integration_sleeps.start_at", &text("start_at")?)?,
        end_at: parse_timestamp("integration_sleeps.end_at", &text("end_at")?)?,
        local_date: parse_date("integration_sleeps.local_date", &text("local_date")?)?,
        source_tz_offset_minutes: row
            .try_get("source_tz_offset_minutes")
            .map_err(query_err("read tz offset"))?,
        duration_seconds: row
            .try_get("duration_seconds")
            .map_err(query_err("read duration"))?,
        sleep_score: row.try_get("sleep_score").map_err(query_err("read sleep score"))?,
        is_nap: row.try_get("is_nap").map_err(query_err("read is_nap"))?,
        is_primary: row.try_get("is_primary").map_err(query_err("read is_primary"))?,
        extras: extras
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DatabaseError::serialization(format!("sleep extras: {e}")))?
            .unwrap_or_default(),
    })
}
