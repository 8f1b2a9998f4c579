// ABOUTME: Maps raw WHOOP payloads to provider-agnostic sleep, recovery, workout, and cycle records
// ABOUTME: Pure functions; records missing mandatory instants or ids are skipped, never fatal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, NaiveDate, Utc};
use healthmetrics_core::models::{
    CycleRecord, NormalizedRecord, RecoveryRecord, ResourceType, SleepRecord, WorkoutRecord,
};
use healthmetrics_core::payload::Payload;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// Kilojoules per kilocalorie
const KILOJOULES_PER_KCAL: f64 = 4.184;

/// Meters per kilometer
const METERS_PER_KM: f64 = 1000.0;

/// Candidate id keys, in lookup order
const ID_KEYS: [&str; 4] = ["id", "cycle_id", "sleep_id", "workout_id"];

/// Normalize one collection record, or `None` when it should be skipped
#[must_use]
pub fn normalize(
    resource: ResourceType,
    integration_id: Uuid,
    record: &Map<String, Value>,
) -> Option<NormalizedRecord> {
    let normalized = match resource {
        ResourceType::Sleep => normalize_sleep(integration_id, record).map(NormalizedRecord::Sleep),
        ResourceType::Recovery => {
            normalize_recovery(integration_id, record).map(NormalizedRecord::Recovery)
        }
        ResourceType::Workout => {
            normalize_workout(integration_id, record).map(NormalizedRecord::Workout)
        }
        ResourceType::Cycle => normalize_cycle(integration_id, record).map(NormalizedRecord::Cycle),
        ResourceType::Profile | ResourceType::BodyMeasurement => return None,
    };

    if normalized.is_none() {
        debug!(resource = %resource, "skipping WHOOP record without usable instants or id");
    }
    normalized
}

/// Source id for raw-event storage
///
/// Tries `id`, `cycle_id`, `sleep_id`, `workout_id` in order, then the
/// fallback (used for single-object resources).
#[must_use]
pub fn extract_source_id(record: &Map<String, Value>, fallback: Option<&str>) -> Option<String> {
    let payload = Payload::new(record);
    ID_KEYS
        .iter()
        .find_map(|key| payload.identifier(key))
        .or_else(|| fallback.map(str::to_owned))
}

/// Largest offset accepted from upstream, in minutes
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Parse a signed `"hh:mm"` offset into minutes
///
/// `"Z"`, empty, malformed, and out-of-range values all yield 0.
#[must_use]
pub fn parse_timezone_offset_minutes(value: &str) -> i32 {
    if value.is_empty() || value == "Z" {
        return 0;
    }

    let (sign, rest) = if let Some(rest) = value.strip_prefix('-') {
        (-1, rest)
    } else {
        (1, value.strip_prefix('+').unwrap_or(value))
    };

    let Some((hours, minutes)) = rest.split_once(':') else {
        return 0;
    };
    if minutes.contains(':') {
        return 0;
    }

    let (Ok(h), Ok(m)) = (hours.parse::<i32>(), minutes.parse::<i32>()) else {
        return 0;
    };
    if h < 0 || !(0..60).contains(&m) {
        return 0;
    }

    h.checked_mul(60)
        .and_then(|total| total.checked_add(m))
        .filter(|total| *total <= MAX_OFFSET_MINUTES)
        .map_or(0, |total| sign * total)
}

/// Calendar date of `instant` once shifted by `offset_minutes`
#[must_use]
pub fn local_date_from(instant: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    (instant + Duration::minutes(i64::from(offset_minutes))).date_naive()
}

/// Kilojoules to kilocalories
#[must_use]
pub fn kilojoules_to_kcal(kilojoules: f64) -> f64 {
    kilojoules / KILOJOULES_PER_KCAL
}

/// Meters to kilometers
#[must_use]
pub fn meters_to_km(meters: f64) -> f64 {
    meters / METERS_PER_KM
}

fn parse_instant(payload: &Payload<'_>, key: &str) -> Option<DateTime<Utc>> {
    let raw = payload.text(key)?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn rounded(value: Option<f64>) -> Option<i32> {
    value.map(|v| v.round() as i32)
}

fn span(payload: &Payload<'_>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((parse_instant(payload, "start")?, parse_instant(payload, "end")?))
}

fn offset(payload: &Payload<'_>) -> i32 {
    payload
        .text("timezone_offset")
        .map_or(0, parse_timezone_offset_minutes)
}

/// Sleep session, anchored on `start`
#[must_use]
pub fn normalize_sleep(integration_id: Uuid, record: &Map<String, Value>) -> Option<SleepRecord> {
    let payload = Payload::new(record);
    let (start_at, end_at) = span(&payload)?;
    let external_id = payload.identifier("id")?;

    let tz = offset(&payload);
    let score = payload.nested("score");

    Some(SleepRecord {
        integration_id,
        external_id,
        start_at,
        end_at,
        local_date: local_date_from(start_at, tz),
        source_tz_offset_minutes: tz,
        duration_seconds: (end_at - start_at).num_seconds().max(0),
        sleep_score: rounded(score.and_then(|s| s.number("sleep_performance_percentage"))),
        is_nap: payload.flag("nap"),
        is_primary: false,
        extras: Value::Object(record.clone()),
    })
}

/// Recovery score, anchored on `created_at`, keyed by `cycle_id` when present
#[must_use]
pub fn normalize_recovery(integration_id: Uuid, record: &Map<String, Value>) -> Option<RecoveryRecord> {
    let payload = Payload::new(record);
    let recorded_at = parse_instant(&payload, "created_at")?;
    let external_id = payload
        .identifier("cycle_id")
        .or_else(|| payload.identifier("id"))?;

    let tz = offset(&payload);
    let score = payload.nested("score");
    let metric = |key: &str| score.and_then(|s| s.number(key));

    Some(RecoveryRecord {
        integration_id,
        external_id,
        recorded_at,
        local_date: local_date_from(recorded_at, tz),
        source_tz_offset_minutes: tz,
        recovery_score: rounded(metric("recovery_score")),
        hrv_rmssd_ms: metric("hrv_rmssd_milli"),
        resting_hr_bpm: rounded(metric("resting_heart_rate")),
        spo2_pct: metric("spo2_percentage"),
        extras: Value::Object(record.clone()),
    })
}

/// Physiological cycle, anchored on `start`
#[must_use]
pub fn normalize_cycle(integration_id: Uuid, record: &Map<String, Value>) -> Option<CycleRecord> {
    let payload = Payload::new(record);
    let (start_at, end_at) = span(&payload)?;
    let external_id = payload.identifier("id")?;

    let tz = offset(&payload);
    let score = payload.nested("score");
    let metric = |key: &str| score.and_then(|s| s.number(key));

    Some(CycleRecord {
        integration_id,
        external_id,
        start_at,
        end_at,
        local_date: local_date_from(start_at, tz),
        source_tz_offset_minutes: tz,
        day_strain: metric("strain"),
        kilojoules: metric("kilojoule"),
        avg_hr_bpm: rounded(metric("average_heart_rate")),
        max_hr_bpm: rounded(metric("max_heart_rate")),
        extras: Value::Object(record.clone()),
    })
}

/// Workout, anchored on `start`
#[must_use]
pub fn normalize_workout(integration_id: Uuid, record: &Map<String, Value>) -> Option<WorkoutRecord> {
    let payload = Payload::new(record);
    let (start_at, end_at) = span(&payload)?;
    let external_id = payload.identifier("id")?;

    let tz = offset(&payload);
    let score = payload.nested("score");
    let metric = |key: &str| score.and_then(|s| s.number(key));

    Some(WorkoutRecord {
        integration_id,
        external_id,
        start_at,
        end_at,
        local_date: local_date_from(start_at, tz),
        source_tz_offset_minutes: tz,
        sport_name: payload.text("sport_name").map(str::to_owned),
        strain: metric("strain"),
        calories_kcal: metric("kilojoule").map(kilojoules_to_kcal),
        distance_km: metric("distance_meter").map(meters_to_km),
        extras: Value::Object(record.clone()),
    })
}
