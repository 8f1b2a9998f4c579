// ABOUTME: Provider-agnostic normalized records for sleep, recovery, workout, and cycle data
// ABOUTME: Each row is keyed by (integration, external id) and carries the raw payload as extras
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ResourceType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One sleep session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Owning integration
    pub integration_id: Uuid,
    /// Provider-assigned id
    pub external_id: String,
    /// Session start
    pub start_at: DateTime<Utc>,
    /// Session end
    pub end_at: DateTime<Utc>,
    /// Calendar date of `start_at` shifted by the source offset
    pub local_date: NaiveDate,
    /// Signed offset in minutes used to derive `local_date`
    pub source_tz_offset_minutes: i32,
    /// `end_at - start_at`, never negative
    pub duration_seconds: i64,
    /// Sleep performance percentage, rounded
    pub sleep_score: Option<i32>,
    /// Provider flagged this session as a nap
    pub is_nap: bool,
    /// Longest session of its local date, set by the primary-sleep pass
    pub is_primary: bool,
    /// Full raw payload
    pub extras: Value,
}

/// One recovery score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    /// Owning integration
    pub integration_id: Uuid,
    /// Provider-assigned id (cycle id when present)
    pub external_id: String,
    /// When the provider scored the recovery
    pub recorded_at: DateTime<Utc>,
    /// Calendar date of `recorded_at` shifted by the source offset
    pub local_date: NaiveDate,
    /// Signed offset in minutes used to derive `local_date`
    pub source_tz_offset_minutes: i32,
    /// Recovery score, rounded
    pub recovery_score: Option<i32>,
    /// Heart rate variability (RMSSD) in milliseconds
    pub hrv_rmssd_ms: Option<f64>,
    /// Resting heart rate, rounded
    pub resting_hr_bpm: Option<i32>,
    /// Blood oxygen saturation percentage
    pub spo2_pct: Option<f64>,
    /// Full raw payload
    pub extras: Value,
}

/// One workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Owning integration
    pub integration_id: Uuid,
    /// Provider-assigned id
    pub external_id: String,
    /// Workout start
    pub start_at: DateTime<Utc>,
    /// Workout end
    pub end_at: DateTime<Utc>,
    /// Calendar date of `start_at` shifted by the source offset
    pub local_date: NaiveDate,
    /// Signed offset in minutes used to derive `local_date`
    pub source_tz_offset_minutes: i32,
    /// Sport label reported by the provider
    pub sport_name: Option<String>,
    /// Provider strain score
    pub strain: Option<f64>,
    /// Energy in kilocalories
    pub calories_kcal: Option<f64>,
    /// Distance in kilometers
    pub distance_km: Option<f64>,
    /// Full raw payload
    pub extras: Value,
}

/// One physiological cycle (roughly a day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Owning integration
    pub integration_id: Uuid,
    /// Provider-assigned id
    pub external_id: String,
    /// Cycle start
    pub start_at: DateTime<Utc>,
    /// Cycle end
    pub end_at: DateTime<Utc>,
    /// Calendar date of `start_at` shifted by the source offset
    pub local_date: NaiveDate,
    /// Signed offset in minutes used to derive `local_date`
    pub source_tz_offset_minutes: i32,
    /// Day strain score
    pub day_strain: Option<f64>,
    /// Energy expenditure in kilojoules
    pub kilojoules: Option<f64>,
    /// Average heart rate, rounded
    pub avg_hr_bpm: Option<i32>,
    /// Maximum heart rate, rounded
    pub max_hr_bpm: Option<i32>,
    /// Full raw payload
    pub extras: Value,
}

/// Output of the normalizer for any collection resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedRecord {
    /// Sleep session
    Sleep(SleepRecord),
    /// Recovery score
    Recovery(RecoveryRecord),
    /// Workout
    Workout(WorkoutRecord),
    /// Physiological cycle
    Cycle(CycleRecord),
}

impl NormalizedRecord {
    /// Resource kind this record came from
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        match self {
            Self::Sleep(_) => ResourceType::Sleep,
            Self::Recovery(_) => ResourceType::Recovery,
            Self::Workout(_) => ResourceType::Workout,
            Self::Cycle(_) => ResourceType::Cycle,
        }
    }

    /// Provider-assigned id
    #[must_use]
    pub fn external_id(&self) -> &str {
        match self {
            Self::Sleep(r) => &r.external_id,
            Self::Recovery(r) => &r.external_id,
            Self::Workout(r) => &r.external_id,
            Self::Cycle(r) => &r.external_id,
        }
    }
}
