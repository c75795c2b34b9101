// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store for deterministic testing.
//!
//! All three collections live under one lock, so the conditional delete is
//! atomic. Hooks allow a test to fail a schedule scan or to land a booking
//! right after a scan, which is how a concurrent writer looks to the guard.

use async_trait::async_trait;
use tokio::sync::Mutex;

use adsynk_core::types::{
    AdRecord, AdapterType, ConditionalDelete, HealthStatus, PerformanceEvent, ScheduleFilter,
    ScheduleRecord, ScheduleStatus,
};
use adsynk_core::{AdStore, AdsynkError, PluginAdapter};

#[derive(Default)]
struct Collections {
    ads: Vec<AdRecord>,
    schedules: Vec<ScheduleRecord>,
    events: Vec<PerformanceEvent>,
    fail_schedule_scans: bool,
    land_after_scan: Option<ScheduleRecord>,
}

/// Vec-backed [`AdStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every schedule scan fail with a storage error.
    pub async fn fail_schedule_scans(&self, fail: bool) {
        self.inner.lock().await.fail_schedule_scans = fail;
    }

    /// Insert `schedule` immediately after the next schedule scan returns.
    pub async fn land_booking_after_next_scan(&self, schedule: ScheduleRecord) {
        self.inner.lock().await.land_after_scan = Some(schedule);
    }
}

fn duplicate(entity: &str, id: &str) -> AdsynkError {
    AdsynkError::Conflict {
        message: format!("{entity} `{id}` already exists"),
        active_count: None,
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AdsynkError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AdStore for MemoryStore {
    async fn insert_ad(&self, ad: &AdRecord) -> Result<(), AdsynkError> {
        let mut inner = self.inner.lock().await;
        if inner.ads.iter().any(|a| a.ad_id == ad.ad_id) {
            return Err(duplicate("ad", &ad.ad_id));
        }
        inner.ads.push(ad.clone());
        Ok(())
    }

    async fn get_ad(&self, ad_id: &str) -> Result<Option<AdRecord>, AdsynkError> {
        let inner = self.inner.lock().await;
        Ok(inner.ads.iter().find(|a| a.ad_id == ad_id).cloned())
    }

    async fn list_ads(&self) -> Result<Vec<AdRecord>, AdsynkError> {
        Ok(self.inner.lock().await.ads.clone())
    }

    async fn update_ad_active(
        &self,
        ad_id: &str,
        active: bool,
        updated_at: &str,
    ) -> Result<bool, AdsynkError> {
        let mut inner = self.inner.lock().await;
        match inner.ads.iter_mut().find(|a| a.ad_id == ad_id) {
            Some(ad) => {
                ad.active = active;
                ad.updated_at = Some(updated_at.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_ad_unless_referenced(
        &self,
        ad_id: &str,
    ) -> Result<ConditionalDelete, AdsynkError> {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner.ads.iter().position(|a| a.ad_id == ad_id) else {
            return Ok(ConditionalDelete::Missing);
        };
        let active_count = inner
            .schedules
            .iter()
            .filter(|s| s.ad_id == ad_id && s.status.is_pending())
            .count();
        if active_count > 0 {
            return Ok(ConditionalDelete::Referenced { active_count });
        }
        inner.ads.remove(pos);
        Ok(ConditionalDelete::Deleted)
    }

    async fn insert_schedule(&self, schedule: &ScheduleRecord) -> Result<(), AdsynkError> {
        let mut inner = self.inner.lock().await;
        if inner
            .schedules
            .iter()
            .any(|s| s.schedule_id == schedule.schedule_id)
        {
            return Err(duplicate("schedule", &schedule.schedule_id));
        }
        inner.schedules.push(schedule.clone());
        Ok(())
    }

    async fn get_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Option<ScheduleRecord>, AdsynkError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .schedules
            .iter()
            .find(|s| s.schedule_id == schedule_id)
            .cloned())
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<Vec<ScheduleRecord>, AdsynkError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_schedule_scans {
            return Err(AdsynkError::storage(std::io::Error::other(
                "schedule scan failed",
            )));
        }
        let found = inner
            .schedules
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        if let Some(late) = inner.land_after_scan.take() {
            inner.schedules.push(late);
        }
        Ok(found)
    }

    async fn update_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<bool, AdsynkError> {
        let mut inner = self.inner.lock().await;
        match inner
            .schedules
            .iter_mut()
            .find(|s| s.schedule_id == schedule_id)
        {
            Some(s) => {
                s.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn append_event(&self, event: &PerformanceEvent) -> Result<(), AdsynkError> {
        self.inner.lock().await.events.push(event.clone());
        Ok(())
    }

    async fn list_events(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<PerformanceEvent>, AdsynkError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.timestamp.as_str() >= from && e.timestamp.as_str() <= to)
            .cloned()
            .collect())
    }
}
