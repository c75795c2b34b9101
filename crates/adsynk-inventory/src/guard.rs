// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Referential check run before an ad is removed.
//!
//! The store has no foreign keys between bookings and ads. The guard scans
//! the bookings of one ad and refuses while any of them is still pending.
//! The scan is a plain read: the removal itself must go through
//! [`AdStore::delete_ad_unless_referenced`] to be safe against a booking that
//! lands after the scan.

use std::sync::Arc;

use tracing::debug;

use adsynk_core::types::ScheduleFilter;
use adsynk_core::{AdStore, AdsynkError};

/// Whether an ad may be deleted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    /// This many `scheduled`/`active` bookings still reference the ad.
    Denied { active_count: usize },
}

#[derive(Clone)]
pub struct DeletionGuard {
    store: Arc<dyn AdStore>,
}

impl DeletionGuard {
    pub fn new(store: Arc<dyn AdStore>) -> Self {
        Self { store }
    }

    /// Decide for `ad_id`. An unknown ad is `NotFound`, not a denial.
    pub async fn can_delete(&self, ad_id: &str) -> Result<GuardDecision, AdsynkError> {
        if self.store.get_ad(ad_id).await?.is_none() {
            return Err(AdsynkError::not_found("ad", ad_id));
        }

        let active_count = self.active_bookings(ad_id).await?;
        debug!(ad_id, active_count, "deletion guard evaluated");
        Ok(if active_count == 0 {
            GuardDecision::Allowed
        } else {
            GuardDecision::Denied { active_count }
        })
    }

    /// Number of pending bookings referencing `ad_id`.
    pub async fn active_bookings(&self, ad_id: &str) -> Result<usize, AdsynkError> {
        let bookings = self.store.list_schedules(&ScheduleFilter::for_ad(ad_id)).await?;
        Ok(bookings.iter().filter(|s| s.status.is_pending()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::ScheduleStatus;
    use adsynk_test_utils::MemoryStore;
    use adsynk_test_utils::fixtures::{ad_fixture, schedule_fixture};

    async fn store_with(bookings: &[(&str, &str, ScheduleStatus)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_ad(&ad_fixture("ad_1")).await.unwrap();
        store.insert_ad(&ad_fixture("ad_2")).await.unwrap();
        for (id, ad, status) in bookings {
            store
                .insert_schedule(&schedule_fixture(id, ad, "2026-03-01T10:00:00", *status))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn allows_without_bookings() {
        let guard = DeletionGuard::new(store_with(&[]).await);
        assert_eq!(guard.can_delete("ad_1").await.unwrap(), GuardDecision::Allowed);
    }

    #[tokio::test]
    async fn allows_when_all_bookings_terminal() {
        let guard = DeletionGuard::new(
            store_with(&[
                ("s1", "ad_1", ScheduleStatus::Completed),
                ("s2", "ad_1", ScheduleStatus::Failed),
                ("s3", "ad_1", ScheduleStatus::Cancelled),
            ])
            .await,
        );
        assert_eq!(guard.can_delete("ad_1").await.unwrap(), GuardDecision::Allowed);
    }

    #[tokio::test]
    async fn denies_with_count_of_pending_bookings() {
        let guard = DeletionGuard::new(
            store_with(&[
                ("s1", "ad_1", ScheduleStatus::Scheduled),
                ("s2", "ad_1", ScheduleStatus::Active),
                ("s3", "ad_1", ScheduleStatus::Completed),
                ("s4", "ad_2", ScheduleStatus::Scheduled),
            ])
            .await,
        );
        assert_eq!(
            guard.can_delete("ad_1").await.unwrap(),
            GuardDecision::Denied { active_count: 2 }
        );
    }

    #[tokio::test]
    async fn unknown_ad_is_not_found() {
        let guard = DeletionGuard::new(store_with(&[]).await);
        let err = guard.can_delete("ad_missing").await.unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { entity: "ad", .. }));
    }

    #[tokio::test]
    async fn scan_failure_propagates() {
        let store = store_with(&[]).await;
        store.fail_schedule_scans(true).await;
        let guard = DeletionGuard::new(store);
        let err = guard.can_delete("ad_1").await.unwrap_err();
        assert!(matches!(err, AdsynkError::Storage { .. }));
    }
}
