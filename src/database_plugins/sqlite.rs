// ABOUTME: SQLite implementation of the integration persistence contract
// ABOUTME: Thin delegation to Database so inspection queries stay reachable through inner()

use super::IntegrationStore;
use crate::database::{Database, DbResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthmetrics_core::models::{
    ConnectedIntegration, CycleRecord, Integration, IntegrationStatus, RecoveryRecord,
    ResourceType, SleepRecord, StoredToken, WorkoutRecord,
};
use serde_json::Value;
use uuid::Uuid;

/// SQLite database implementation
#[derive(Clone)]
pub struct SqliteStore {
    inner: Database,
}

impl SqliteStore {
    /// Connect to `database_url` and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> DbResult<Self> {
        Ok(Self {
            inner: Database::new(database_url).await?,
        })
    }

    /// Wrap an already-migrated database
    #[must_use]
    pub const fn from_database(inner: Database) -> Self {
        Self { inner }
    }

    /// Get a reference to the inner database for inspection queries
    #[must_use]
    pub const fn inner(&self) -> &Database {
        &self.inner
    }
}

#[async_trait]
impl IntegrationStore for SqliteStore {
    async fn upsert_integration(&self, user_id: &str, provider: &str) -> DbResult<Uuid> {
        self.inner.upsert_integration(user_id, provider).await
    }

    async fn mark_connected(&self, integration_id: Uuid) -> DbResult<()> {
        self.inner
            .set_integration_status(integration_id, IntegrationStatus::Connected)
            .await
    }

    async fn mark_disconnected(&self, integration_id: Uuid) -> DbResult<()> {
        self.inner
            .set_integration_status(integration_id, IntegrationStatus::Disconnected)
            .await
    }

    async fn get_integration(&self, user_id: &str, provider: &str) -> DbResult<Integration> {
        self.inner.get_integration(user_id, provider).await
    }

    async fn update_last_sync(&self, integration_id: Uuid, synced_at: DateTime<Utc>) -> DbResult<()> {
        self.inner.update_last_sync(integration_id, synced_at).await
    }

    async fn list_connected_integrations(&self, provider: &str) -> DbResult<Vec<ConnectedIntegration>> {
        self.inner.list_connected_integrations(provider).await
    }

    async fn upsert_token(&self, integration_id: Uuid, token: &StoredToken) -> DbResult<()> {
        self.inner.upsert_token(integration_id, token).await
    }

    async fn has_token(&self, integration_id: Uuid) -> DbResult<bool> {
        self.inner.has_token(integration_id).await
    }

    async fn get_token(&self, integration_id: Uuid) -> DbResult<StoredToken> {
        self.inner.get_token(integration_id).await
    }

    async fn delete_tokens(&self, integration_id: Uuid) -> DbResult<u64> {
        self.inner.delete_tokens(integration_id).await
    }

    async fn upsert_raw_event(
        &self,
        integration_id: Uuid,
        resource_type: ResourceType,
        source_id: &str,
        payload: &Value,
    ) -> DbResult<()> {
        self.inner
            .upsert_raw_event(integration_id, resource_type, source_id, payload)
            .await
    }

    async fn upsert_sleep(&self, record: &SleepRecord) -> DbResult<()> {
        self.inner.upsert_sleep(record).await
    }

    async fn upsert_recovery(&self, record: &RecoveryRecord) -> DbResult<()> {
        self.inner.upsert_recovery(record).await
    }

    async fn upsert_workout(&self, record: &WorkoutRecord) -> DbResult<()> {
        self.inner.upsert_workout(record).await
    }

    async fn upsert_cycle(&self, record: &CycleRecord) -> DbResult<()> {
        self.inner.upsert_cycle(record).await
    }

    async fn select_primary_sleep(&self, integration_id: Uuid) -> DbResult<u64> {
        self.inner.select_primary_sleep(integration_id).await
    }

    async fn upsert_last_error(&self, integration_id: Uuid, message: Option<&str>) -> DbResult<()> {
        self.inner.upsert_last_error(integration_id, message).await
    }

    async fn upsert_provider_user_id(&self, integration_id: Uuid, provider_user_id: &str) -> DbResult<()> {
        self.inner
            .upsert_provider_user_id(integration_id, provider_user_id)
            .await
    }
}
