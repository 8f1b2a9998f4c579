// ABOUTME: Persistence contract consumed by the sync engine
// ABOUTME: Storage backends implement IntegrationStore; SQLite is the production backend

use crate::database::DbResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthmetrics_core::models::{
    ConnectedIntegration, CycleRecord, Integration, NormalizedRecord, RecoveryRecord, ResourceType,
    SleepRecord, StoredToken, WorkoutRecord,
};
use serde_json::Value;
use uuid::Uuid;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Storage abstraction for integrations, tokens, raw events, and normalized records
///
/// Every mutating operation touches rows of a single integration and is an
/// atomic single-row replace-on-conflict, so callers may run syncs for
/// different integrations concurrently without coordination.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    // ================================
    // Integrations
    // ================================

    /// Create the integration row if missing and return its id
    async fn upsert_integration(&self, user_id: &str, provider: &str) -> DbResult<Uuid>;

    /// Flip status to connected
    async fn mark_connected(&self, integration_id: Uuid) -> DbResult<()>;

    /// Flip status to disconnected
    async fn mark_disconnected(&self, integration_id: Uuid) -> DbResult<()>;

    /// Look up an integration, `DatabaseError::NotFound` if absent
    async fn get_integration(&self, user_id: &str, provider: &str) -> DbResult<Integration>;

    /// Record a successful sync time
    async fn update_last_sync(&self, integration_id: Uuid, synced_at: DateTime<Utc>) -> DbResult<()>;

    /// Connected integrations for one provider
    async fn list_connected_integrations(&self, provider: &str) -> DbResult<Vec<ConnectedIntegration>>;

    // ================================
    // Tokens
    // ================================

    /// Store or replace the encrypted token row
    async fn upsert_token(&self, integration_id: Uuid, token: &StoredToken) -> DbResult<()>;

    /// Whether a token row exists
    async fn has_token(&self, integration_id: Uuid) -> DbResult<bool>;

    /// Read the encrypted token row, `DatabaseError::NotFound` if absent
    async fn get_token(&self, integration_id: Uuid) -> DbResult<StoredToken>;

    /// Delete the token row, returning the number of rows removed
    async fn delete_tokens(&self, integration_id: Uuid) -> DbResult<u64>;

    // ================================
    // Raw events and normalized records
    // ================================

    /// Archive a verbatim payload keyed by (integration, resource type, source id)
    async fn upsert_raw_event(
        &self,
        integration_id: Uuid,
        resource_type: ResourceType,
        source_id: &str,
        payload: &Value,
    ) -> DbResult<()>;

    /// Upsert a sleep row without touching its primary flag on conflict
    async fn upsert_sleep(&self, record: &SleepRecord) -> DbResult<()>;

    /// Upsert a recovery row
    async fn upsert_recovery(&self, record: &RecoveryRecord) -> DbResult<()>;

    /// Upsert a workout row
    async fn upsert_workout(&self, record: &WorkoutRecord) -> DbResult<()>;

    /// Upsert a cycle row
    async fn upsert_cycle(&self, record: &CycleRecord) -> DbResult<()>;

    /// Dispatch a normalized record to its typed upsert
    async fn upsert_normalized(&self, record: &NormalizedRecord) -> DbResult<()> {
        match record {
            NormalizedRecord::Sleep(r) => self.upsert_sleep(r).await,
            NormalizedRecord::Recovery(r) => self.upsert_recovery(r).await,
            NormalizedRecord::Workout(r) => self.upsert_workout(r).await,
            NormalizedRecord::Cycle(r) => self.upsert_cycle(r).await,
        }
    }

    /// Mark exactly one primary sleep per local date
    async fn select_primary_sleep(&self, integration_id: Uuid) -> DbResult<u64>;

    // ================================
    // Connection side record
    // ================================

    /// Set or clear the last sync error
    async fn upsert_last_error(&self, integration_id: Uuid, message: Option<&str>) -> DbResult<()>;

    /// Remember the provider's own user id
    async fn upsert_provider_user_id(&self, integration_id: Uuid, provider_user_id: &str) -> DbResult<()>;
}
