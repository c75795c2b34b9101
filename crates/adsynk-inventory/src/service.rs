// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory and booking operations.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use adsynk_core::types::{
    AdRecord, ConditionalDelete, PerformanceEvent, ScheduleFilter, ScheduleRecord,
    ScheduleStatus, UploadStatus, active_flag, naive_iso, parse_iso_utc, timestamped_id,
};
use adsynk_core::{AdStore, AdsynkError};

use crate::guard::{DeletionGuard, GuardDecision};

const DEFAULT_DURATION_SECS: u32 = 30;

/// Input for [`InventoryService::create_ad`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewAd {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub advertiser: String,
    /// Seconds; 30 when absent.
    #[serde(default, alias = "duration")]
    pub duration_secs: Option<u32>,
    /// `true` when absent. Strings compare case-insensitively against `"true"`.
    #[serde(default, deserialize_with = "active_flag::deserialize_optional")]
    pub active: Option<bool>,
}

/// Input for [`InventoryService::create_schedule`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewSchedule {
    #[serde(default)]
    pub ad_id: String,
    /// ISO-8601, with or without offset.
    #[serde(default)]
    pub schedule_time: String,
    #[serde(default)]
    pub event_name: String,
    /// Seconds; 30 when absent.
    #[serde(default, alias = "duration")]
    pub duration_secs: Option<u32>,
}

/// Hands out strictly increasing instants so two records created within the
/// same microsecond still get distinct identifiers.
#[derive(Default)]
struct IdClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl IdClock {
    fn next(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let instant = match *last {
            Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
            _ => now,
        };
        *last = Some(instant);
        instant
    }
}

/// Create, update and delete ads and bookings.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn AdStore>,
    guard: DeletionGuard,
    clock: Arc<IdClock>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn AdStore>) -> Self {
        Self {
            guard: DeletionGuard::new(store.clone()),
            store,
            clock: Arc::new(IdClock::default()),
        }
    }

    pub fn guard(&self) -> &DeletionGuard {
        &self.guard
    }

    /// Add an ad. New ads start `PENDING` upload.
    pub async fn create_ad(&self, input: NewAd) -> Result<AdRecord, AdsynkError> {
        let now = self.clock.next(Utc::now());
        let ad = AdRecord {
            ad_id: timestamped_id("ad", now),
            title: input.title,
            advertiser: input.advertiser,
            duration_secs: input.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
            active: input.active.unwrap_or(true),
            upload_status: UploadStatus::Pending,
            created_at: naive_iso(now),
            updated_at: None,
        };
        self.store.insert_ad(&ad).await?;
        info!(ad_id = %ad.ad_id, advertiser = %ad.advertiser, "ad created");
        Ok(ad)
    }

    pub async fn get_ad(&self, ad_id: &str) -> Result<AdRecord, AdsynkError> {
        self.store
            .get_ad(ad_id)
            .await?
            .ok_or_else(|| AdsynkError::not_found("ad", ad_id))
    }

    pub async fn list_ads(&self) -> Result<Vec<AdRecord>, AdsynkError> {
        self.store.list_ads().await
    }

    /// Bookings, optionally only those of one ad.
    pub async fn list_schedules(
        &self,
        ad_id: Option<&str>,
    ) -> Result<Vec<ScheduleRecord>, AdsynkError> {
        let filter = match ad_id {
            Some(id) => ScheduleFilter::for_ad(id),
            None => ScheduleFilter::default(),
        };
        self.store.list_schedules(&filter).await
    }

    /// Flip the active flag and stamp `updated_at`.
    pub async fn set_ad_active(&self, ad_id: &str, active: bool) -> Result<AdRecord, AdsynkError> {
        let updated_at = naive_iso(Utc::now());
        if !self.store.update_ad_active(ad_id, active, &updated_at).await? {
            return Err(AdsynkError::not_found("ad", ad_id));
        }
        info!(ad_id, active, "ad active flag updated");
        self.get_ad(ad_id).await
    }

    /// Remove an ad that no pending booking references.
    ///
    /// The guard answers first; the store then deletes conditionally, so a
    /// booking that lands in between still blocks the removal.
    pub async fn delete_ad(&self, ad_id: &str) -> Result<(), AdsynkError> {
        if let GuardDecision::Denied { active_count } = self.guard.can_delete(ad_id).await? {
            return Err(referenced(ad_id, active_count));
        }

        match self.store.delete_ad_unless_referenced(ad_id).await? {
            ConditionalDelete::Deleted => {
                info!(ad_id, "ad deleted");
                Ok(())
            }
            ConditionalDelete::Missing => Err(AdsynkError::not_found("ad", ad_id)),
            ConditionalDelete::Referenced { active_count } => {
                warn!(ad_id, active_count, "booking landed after guard check, delete refused");
                Err(referenced(ad_id, active_count))
            }
        }
    }

    /// Book an ad into a live event. New bookings start `scheduled`.
    pub async fn create_schedule(&self, input: NewSchedule) -> Result<ScheduleRecord, AdsynkError> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("ad_id", &input.ad_id),
            ("schedule_time", &input.schedule_time),
            ("event_name", &input.event_name),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(AdsynkError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if parse_iso_utc(&input.schedule_time).is_none() {
            return Err(AdsynkError::InvalidInput(format!(
                "schedule_time `{}` is not an ISO-8601 timestamp",
                input.schedule_time
            )));
        }
        // Inactive ads may still be booked.
        self.get_ad(&input.ad_id).await?;

        let now = self.clock.next(Utc::now());
        let schedule = ScheduleRecord {
            schedule_id: timestamped_id("schedule", now),
            ad_id: input.ad_id,
            schedule_time: input.schedule_time,
            event_name: input.event_name,
            duration_secs: input.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
            status: ScheduleStatus::Scheduled,
            created_at: naive_iso(now),
        };
        self.store.insert_schedule(&schedule).await?;
        info!(
            schedule_id = %schedule.schedule_id,
            ad_id = %schedule.ad_id,
            schedule_time = %schedule.schedule_time,
            "booking created"
        );
        Ok(schedule)
    }

    /// Move a booking to `status`, e.g. `completed` after playout.
    pub async fn set_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<ScheduleRecord, AdsynkError> {
        if !self.store.update_schedule_status(schedule_id, status).await? {
            return Err(AdsynkError::not_found("schedule", schedule_id));
        }
        info!(schedule_id, status = %status, "booking status updated");
        self.store
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| AdsynkError::not_found("schedule", schedule_id))
    }

    /// Append a performance event. The timestamp must be ISO-8601.
    pub async fn record_event(&self, event: PerformanceEvent) -> Result<(), AdsynkError> {
        if parse_iso_utc(&event.timestamp).is_none() {
            return Err(AdsynkError::InvalidInput(format!(
                "event timestamp `{}` is not an ISO-8601 timestamp",
                event.timestamp
            )));
        }
        self.store.append_event(&event).await
    }
}

fn referenced(ad_id: &str, active_count: usize) -> AdsynkError {
    AdsynkError::Conflict {
        message: format!("ad `{ad_id}` is referenced by {active_count} pending booking(s)"),
        active_count: Some(active_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::EventType;
    use adsynk_test_utils::MemoryStore;
    use adsynk_test_utils::fixtures::{event_fixture, schedule_fixture};

    fn service() -> (InventoryService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (InventoryService::new(store.clone()), store)
    }

    fn booking(ad_id: &str) -> NewSchedule {
        NewSchedule {
            ad_id: ad_id.to_string(),
            schedule_time: "2026-03-01T10:00:00+09:00".to_string(),
            event_name: "Derby".to_string(),
            duration_secs: None,
        }
    }

    #[tokio::test]
    async fn create_ad_applies_defaults() {
        let (service, _) = service();
        let ad = service
            .create_ad(NewAd {
                title: "Launch".into(),
                advertiser: "Orbital".into(),
                ..NewAd::default()
            })
            .await
            .unwrap();
        assert!(ad.ad_id.starts_with("ad_"));
        assert_eq!(ad.duration_secs, 30);
        assert!(ad.active);
        assert_eq!(ad.upload_status, UploadStatus::Pending);
        assert_eq!(service.list_ads().await.unwrap(), vec![ad]);
    }

    #[tokio::test]
    async fn rapid_creations_get_distinct_ids() {
        let (service, _) = service();
        let mut ids = Vec::new();
        for _ in 0..20 {
            ids.push(service.create_ad(NewAd::default()).await.unwrap().ad_id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn new_ad_accepts_string_or_bool_active() {
        let ad: NewAd = serde_json::from_str(r#"{"title":"t","active":"FALSE"}"#).unwrap();
        assert_eq!(ad.active, Some(false));
        let ad: NewAd = serde_json::from_str(r#"{"active":true,"duration":15}"#).unwrap();
        assert_eq!(ad.active, Some(true));
        assert_eq!(ad.duration_secs, Some(15));
        let ad: NewAd = serde_json::from_str(r#"{"active":"yes"}"#).unwrap();
        assert_eq!(ad.active, Some(false));
        let ad: NewAd = serde_json::from_str("{}").unwrap();
        assert_eq!(ad.active, None);
    }

    #[tokio::test]
    async fn null_active_defaults_to_true() {
        let input: NewAd = serde_json::from_str(r#"{"title":"t","active":null}"#).unwrap();
        assert_eq!(input.active, None);
        let (service, _) = service();
        assert!(service.create_ad(input).await.unwrap().active);
    }

    #[tokio::test]
    async fn set_active_updates_flag_and_timestamp() {
        let (service, _) = service();
        let ad = service.create_ad(NewAd::default()).await.unwrap();
        let updated = service.set_ad_active(&ad.ad_id, false).await.unwrap();
        assert!(!updated.active);
        assert!(updated.updated_at.is_some());

        let err = service.set_ad_active("ad_missing", true).await.unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_blocked_until_bookings_finish() {
        let (service, _) = service();
        let ad = service.create_ad(NewAd::default()).await.unwrap();
        let schedule = service.create_schedule(booking(&ad.ad_id)).await.unwrap();

        let err = service.delete_ad(&ad.ad_id).await.unwrap_err();
        match err {
            AdsynkError::Conflict { active_count, .. } => assert_eq!(active_count, Some(1)),
            other => panic!("expected Conflict, got {other:?}"),
        }

        service
            .set_schedule_status(&schedule.schedule_id, ScheduleStatus::Completed)
            .await
            .unwrap();
        service.delete_ad(&ad.ad_id).await.unwrap();
        let err = service.delete_ad(&ad.ad_id).await.unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn booking_landing_after_guard_is_caught() {
        let (service, store) = service();
        let ad = service.create_ad(NewAd::default()).await.unwrap();
        store
            .land_booking_after_next_scan(schedule_fixture(
                "late",
                &ad.ad_id,
                "2026-03-01T10:00:00",
                ScheduleStatus::Scheduled,
            ))
            .await;

        let err = service.delete_ad(&ad.ad_id).await.unwrap_err();
        match err {
            AdsynkError::Conflict { active_count, .. } => assert_eq!(active_count, Some(1)),
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert!(service.get_ad(&ad.ad_id).await.is_ok());
    }

    #[tokio::test]
    async fn create_schedule_validates_input() {
        let (service, _) = service();
        let err = service
            .create_schedule(NewSchedule::default())
            .await
            .unwrap_err();
        let AdsynkError::InvalidInput(msg) = err else {
            panic!("expected InvalidInput");
        };
        assert!(msg.contains("ad_id") && msg.contains("schedule_time") && msg.contains("event_name"));

        let mut bad_time = booking("ad_x");
        bad_time.schedule_time = "soon".into();
        assert!(matches!(
            service.create_schedule(bad_time).await.unwrap_err(),
            AdsynkError::InvalidInput(_)
        ));

        assert!(matches!(
            service.create_schedule(booking("ad_unknown")).await.unwrap_err(),
            AdsynkError::NotFound { entity: "ad", .. }
        ));
    }

    #[tokio::test]
    async fn inactive_ads_can_be_booked() {
        let (service, _) = service();
        let ad = service
            .create_ad(NewAd {
                active: Some(false),
                ..NewAd::default()
            })
            .await
            .unwrap();
        let schedule = service.create_schedule(booking(&ad.ad_id)).await.unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Scheduled);
        assert_eq!(schedule.duration_secs, 30);
        assert!(schedule.schedule_id.starts_with("schedule_"));
        assert_eq!(service.list_schedules(Some(&ad.ad_id)).await.unwrap().len(), 1);
        assert!(service.list_schedules(Some("other")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_schedule_status_unknown_is_not_found() {
        let (service, _) = service();
        let err = service
            .set_schedule_status("schedule_missing", ScheduleStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { entity: "schedule", .. }));
    }

    #[tokio::test]
    async fn record_event_checks_timestamp() {
        let (service, store) = service();
        service
            .record_event(event_fixture(Some("ad_1"), "success", "2026-03-01T00:00:00", Some(30.0)))
            .await
            .unwrap();
        let err = service
            .record_event(event_fixture(None, "insertion", "later", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AdsynkError::InvalidInput(_)));

        let events = store
            .list_events("2026-03-01T00:00:00", "2026-03-01T23:59:59")
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Success);
    }
}
