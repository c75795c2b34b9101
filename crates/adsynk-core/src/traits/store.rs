// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed store holding the inventory, booking, and event collections.

use async_trait::async_trait;

use crate::error::AdsynkError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AdRecord, ConditionalDelete, PerformanceEvent, ScheduleFilter, ScheduleRecord,
    ScheduleStatus,
};

/// Persistence for ads, schedules, and performance events.
///
/// Schedule scans are full-collection with the filter applied by the store.
/// No secondary index on the ad reference is assumed.
#[async_trait]
pub trait AdStore: PluginAdapter {
    /// Insert a new ad. A duplicate identifier is a `Conflict`.
    async fn insert_ad(&self, ad: &AdRecord) -> Result<(), AdsynkError>;

    async fn get_ad(&self, ad_id: &str) -> Result<Option<AdRecord>, AdsynkError>;

    async fn list_ads(&self) -> Result<Vec<AdRecord>, AdsynkError>;

    /// Set the active flag. Returns `false` when the ad does not exist.
    async fn update_ad_active(
        &self,
        ad_id: &str,
        active: bool,
        updated_at: &str,
    ) -> Result<bool, AdsynkError>;

    /// Remove the ad only if no `scheduled`/`active` booking references it.
    ///
    /// Implementations must make the check and the removal one atomic step.
    async fn delete_ad_unless_referenced(
        &self,
        ad_id: &str,
    ) -> Result<ConditionalDelete, AdsynkError>;

    /// Insert a new booking. A duplicate identifier is a `Conflict`.
    async fn insert_schedule(&self, schedule: &ScheduleRecord) -> Result<(), AdsynkError>;

    async fn get_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Option<ScheduleRecord>, AdsynkError>;

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<Vec<ScheduleRecord>, AdsynkError>;

    /// Returns `false` when the booking does not exist.
    async fn update_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<bool, AdsynkError>;

    async fn append_event(&self, event: &PerformanceEvent) -> Result<(), AdsynkError>;

    /// Events whose timestamp string lies in `[from, to]`, in insertion order.
    async fn list_events(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<PerformanceEvent>, AdsynkError>;
}
