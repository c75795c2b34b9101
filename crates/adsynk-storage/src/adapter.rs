// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`AdStore`] trait.

use adsynk_config::model::StorageConfig;
use adsynk_core::types::{
    AdRecord, ConditionalDelete, PerformanceEvent, ScheduleFilter, ScheduleRecord,
    ScheduleStatus,
};
use adsynk_core::{AdStore, AdapterType, AdsynkError, HealthStatus, PluginAdapter};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
/// The database is opened by [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for `config`. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, AdsynkError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Open the database file and run migrations.
    pub async fn initialize(&self) -> Result<(), AdsynkError> {
        let db = Database::open_with_wal(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AdsynkError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, AdsynkError> {
        self.db.get().ok_or_else(|| AdsynkError::Storage {
            source: "storage not initialized; call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AdsynkError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AdsynkError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                })
                .await
                .map_err(map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl AdStore for SqliteStore {
    async fn insert_ad(&self, ad: &AdRecord) -> Result<(), AdsynkError> {
        queries::ads::insert_ad(self.db()?, ad).await
    }

    async fn get_ad(&self, ad_id: &str) -> Result<Option<AdRecord>, AdsynkError> {
        queries::ads::get_ad(self.db()?, ad_id).await
    }

    async fn list_ads(&self) -> Result<Vec<AdRecord>, AdsynkError> {
        queries::ads::list_ads(self.db()?).await
    }

    async fn update_ad_active(
        &self,
        ad_id: &str,
        active: bool,
        updated_at: &str,
    ) -> Result<bool, AdsynkError> {
        queries::ads::update_ad_active(self.db()?, ad_id, active, updated_at).await
    }

    async fn delete_ad_unless_referenced(
        &self,
        ad_id: &str,
    ) -> Result<ConditionalDelete, AdsynkError> {
        queries::ads::delete_ad_unless_referenced(self.db()?, ad_id).await
    }

    async fn insert_schedule(&self, schedule: &ScheduleRecord) -> Result<(), AdsynkError> {
        queries::schedules::insert_schedule(self.db()?, schedule).await
    }

    async fn get_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Option<ScheduleRecord>, AdsynkError> {
        queries::schedules::get_schedule(self.db()?, schedule_id).await
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<Vec<ScheduleRecord>, AdsynkError> {
        queries::schedules::list_schedules(self.db()?, filter).await
    }

    async fn update_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<bool, AdsynkError> {
        queries::schedules::update_schedule_status(self.db()?, schedule_id, status).await
    }

    async fn append_event(&self, event: &PerformanceEvent) -> Result<(), AdsynkError> {
        queries::events::append_event(self.db()?, event).await
    }

    async fn list_events(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<PerformanceEvent>, AdsynkError> {
        queries::events::list_events(self.db()?, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::UploadStatus;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_store_identity() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("identity.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert!(store.health_check().await.is_err());
        store.initialize().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn booking_lifecycle_releases_ad() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteStore::open(make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        let ad = AdRecord {
            ad_id: "ad_20260301_000000_000001".to_string(),
            title: "Launch".to_string(),
            advertiser: "Orbital".to_string(),
            duration_secs: 15,
            active: true,
            upload_status: UploadStatus::Ready,
            created_at: "2026-03-01T00:00:00.000001".to_string(),
            updated_at: None,
        };
        store.insert_ad(&ad).await.unwrap();
        store
            .insert_schedule(&ScheduleRecord {
                schedule_id: "schedule_1".to_string(),
                ad_id: ad.ad_id.clone(),
                schedule_time: "2026-03-05T20:00:00+09:00".to_string(),
                event_name: "Final".to_string(),
                duration_secs: 15,
                status: ScheduleStatus::Scheduled,
                created_at: "2026-03-01T00:00:01.000000".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            store.delete_ad_unless_referenced(&ad.ad_id).await.unwrap(),
            ConditionalDelete::Referenced { active_count: 1 }
        );
        store
            .update_schedule_status("schedule_1", ScheduleStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            store.delete_ad_unless_referenced(&ad.ad_id).await.unwrap(),
            ConditionalDelete::Deleted
        );

        store.shutdown().await.unwrap();
    }
}
