// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splice insert requests and the scheduler that forwards them.

use std::sync::Arc;
use std::time::Duration;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::info;

use adsynk_core::types::{ChannelInfo, ScheduleAction, ScheduleRecord, parse_iso_utc};
use adsynk_core::{AdsynkError, ChannelScheduler};

/// An unvalidated splice insert.
///
/// Every field is required. The duration stays in seconds until the request
/// is turned into a wire [`ScheduleAction`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpliceRequest {
    pub action_name: Option<String>,
    /// ISO-8601, with or without offset; naive times are UTC.
    pub schedule_time: Option<String>,
    pub splice_event_id: Option<u32>,
    pub duration: Option<Duration>,
}

impl SpliceRequest {
    /// A splice for `schedule`, named `<prefix>-<schedule_id>`.
    pub fn for_schedule(schedule: &ScheduleRecord, splice_event_id: u32, prefix: &str) -> Self {
        Self {
            action_name: Some(format!("{prefix}-{}", schedule.schedule_id)),
            schedule_time: Some(schedule.schedule_time.clone()),
            splice_event_id: Some(splice_event_id),
            duration: Some(Duration::from_secs(u64::from(schedule.duration_secs))),
        }
    }

    /// Check every field and produce the wire action.
    ///
    /// Empty strings and zero values count as missing.
    pub fn validate(&self) -> Result<ScheduleAction, AdsynkError> {
        let action_name = self.action_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let schedule_time = self.schedule_time.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let splice_event_id = self.splice_event_id.filter(|id| *id != 0);
        let duration = self.duration.filter(|d| !d.is_zero());

        let mut missing = Vec::new();
        if action_name.is_none() {
            missing.push("action_name");
        }
        if schedule_time.is_none() {
            missing.push("schedule_time");
        }
        if splice_event_id.is_none() {
            missing.push("splice_event_id");
        }
        if duration.is_none() {
            missing.push("duration");
        }
        let (Some(action_name), Some(schedule_time), Some(splice_event_id), Some(duration)) =
            (action_name, schedule_time, splice_event_id, duration)
        else {
            return Err(AdsynkError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        };

        let start = parse_iso_utc(schedule_time).ok_or_else(|| {
            AdsynkError::InvalidInput(format!(
                "schedule_time `{schedule_time}` is not an ISO-8601 timestamp"
            ))
        })?;
        let duration_ms = u64::try_from(duration.as_millis())
            .map_err(|_| AdsynkError::InvalidInput("duration is too large".to_string()))?;

        Ok(ScheduleAction {
            action_name: action_name.to_string(),
            start_time: start.to_rfc3339_opts(SecondsFormat::Micros, true),
            splice_event_id,
            duration_ms,
        })
    }
}

/// Validates splice requests and forwards them to a [`ChannelScheduler`].
///
/// Nothing is retried; a failed call is reported as-is.
#[derive(Clone)]
pub struct SpliceScheduler {
    channel: Arc<dyn ChannelScheduler>,
    action_prefix: String,
}

impl SpliceScheduler {
    pub fn new(channel: Arc<dyn ChannelScheduler>, action_prefix: impl Into<String>) -> Self {
        Self {
            channel,
            action_prefix: action_prefix.into(),
        }
    }

    pub async fn describe_channel(&self, channel_id: &str) -> Result<ChannelInfo, AdsynkError> {
        self.channel.describe_channel(require_channel(channel_id)?).await
    }

    /// Schedule `request` on `channel_id` and return the action that was sent.
    pub async fn schedule_splice(
        &self,
        channel_id: &str,
        request: &SpliceRequest,
    ) -> Result<ScheduleAction, AdsynkError> {
        let channel_id = require_channel(channel_id)?;
        let action = request.validate()?;
        self.channel.create_schedule_action(channel_id, &action).await?;
        info!(
            channel_id,
            action_name = %action.action_name,
            start_time = %action.start_time,
            splice_event_id = action.splice_event_id,
            duration_ms = action.duration_ms,
            "splice insert scheduled"
        );
        Ok(action)
    }

    /// Schedule the splice for a booking, named after the booking.
    pub async fn schedule_booking(
        &self,
        channel_id: &str,
        schedule: &ScheduleRecord,
        splice_event_id: u32,
    ) -> Result<ScheduleAction, AdsynkError> {
        let request = SpliceRequest::for_schedule(schedule, splice_event_id, &self.action_prefix);
        self.schedule_splice(channel_id, &request).await
    }

    pub async fn remove_splice(&self, channel_id: &str, action_name: &str) -> Result<(), AdsynkError> {
        let channel_id = require_channel(channel_id)?;
        if action_name.trim().is_empty() {
            return Err(AdsynkError::InvalidInput(
                "missing required fields: action_name".to_string(),
            ));
        }
        self.channel
            .delete_schedule_action(channel_id, action_name)
            .await?;
        info!(channel_id, action_name, "splice insert removed");
        Ok(())
    }
}

fn require_channel(channel_id: &str) -> Result<&str, AdsynkError> {
    let channel_id = channel_id.trim();
    if channel_id.is_empty() {
        return Err(AdsynkError::InvalidInput(
            "missing required fields: channel_id".to_string(),
        ));
    }
    Ok(channel_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::ScheduleStatus;
    use adsynk_test_utils::MockChannel;
    use adsynk_test_utils::fixtures::schedule_fixture;

    fn request(time: &str) -> SpliceRequest {
        SpliceRequest {
            action_name: Some("break-1".into()),
            schedule_time: Some(time.into()),
            splice_event_id: Some(1001),
            duration: Some(Duration::from_secs(30)),
        }
    }

    #[test]
    fn normalizes_time_and_converts_duration() {
        let action = request("2026-03-01T10:00:00+09:00").validate().unwrap();
        assert_eq!(action.start_time, "2026-03-01T01:00:00.000000Z");
        assert_eq!(action.duration_ms, 30_000);
        assert_eq!(action.splice_event_id, 1001);

        let naive = request("2026-03-01T01:00:00.5").validate().unwrap();
        assert_eq!(naive.start_time, "2026-03-01T01:00:00.500000Z");
    }

    #[test]
    fn lists_every_missing_field() {
        let err = SpliceRequest::default().validate().unwrap_err();
        let AdsynkError::InvalidInput(msg) = err else {
            panic!("expected InvalidInput");
        };
        assert_eq!(
            msg,
            "missing required fields: action_name, schedule_time, splice_event_id, duration"
        );

        let mut partial = request("2026-03-01T01:00:00Z");
        partial.duration = Some(Duration::ZERO);
        partial.action_name = Some("  ".into());
        let AdsynkError::InvalidInput(msg) = partial.validate().unwrap_err() else {
            panic!("expected InvalidInput");
        };
        assert_eq!(msg, "missing required fields: action_name, duration");
    }

    #[test]
    fn unparsable_time_is_invalid() {
        let err = request("next tuesday").validate().unwrap_err();
        assert!(matches!(err, AdsynkError::InvalidInput(_)));
    }

    #[test]
    fn for_schedule_derives_name_time_and_duration() {
        let schedule = schedule_fixture(
            "schedule_20260301_090000_000001",
            "ad_1",
            "2026-03-01T18:00:00+09:00",
            ScheduleStatus::Scheduled,
        );
        let action = SpliceRequest::for_schedule(&schedule, 7, "adsynk")
            .validate()
            .unwrap();
        assert_eq!(action.action_name, "adsynk-schedule_20260301_090000_000001");
        assert_eq!(action.start_time, "2026-03-01T09:00:00.000000Z");
        assert_eq!(action.duration_ms, 30_000);
    }

    #[tokio::test]
    async fn scheduler_forwards_and_surfaces_remote_errors() {
        let channel = Arc::new(MockChannel::new().with_channel("ch-1", "Sports", "RUNNING"));
        let scheduler = SpliceScheduler::new(channel.clone(), "adsynk");

        let info = scheduler.describe_channel("ch-1").await.unwrap();
        assert_eq!(info.state, "RUNNING");

        scheduler
            .schedule_splice("ch-1", &request("2026-03-01T01:00:00Z"))
            .await
            .unwrap();
        assert_eq!(channel.actions("ch-1").await.len(), 1);

        let err = scheduler
            .schedule_splice("ch-1", &request("2026-03-01T02:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdsynkError::Conflict { .. }));

        let err = scheduler
            .schedule_splice("ch-404", &request("2026-03-01T01:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { entity: "channel", .. }));

        scheduler.remove_splice("ch-1", "break-1").await.unwrap();
        assert!(channel.actions("ch-1").await.is_empty());
        let err = scheduler.remove_splice("ch-1", "break-1").await.unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_channel() {
        let channel = Arc::new(MockChannel::new().with_channel("ch-1", "Sports", "RUNNING"));
        let scheduler = SpliceScheduler::new(channel.clone(), "adsynk");
        assert!(scheduler.schedule_splice("ch-1", &SpliceRequest::default()).await.is_err());
        assert!(scheduler.schedule_splice(" ", &request("2026-03-01T01:00:00Z")).await.is_err());
        assert!(channel.actions("ch-1").await.is_empty());
    }
}
