// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-channel scheduling API.

use async_trait::async_trait;

use crate::error::AdsynkError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelInfo, ScheduleAction};

/// Pass-through access to a live channel's schedule.
///
/// Implementations never retry: a mutation either lands once or surfaces
/// its error.
#[async_trait]
pub trait ChannelScheduler: PluginAdapter {
    async fn describe_channel(&self, channel_id: &str) -> Result<ChannelInfo, AdsynkError>;

    async fn create_schedule_action(
        &self,
        channel_id: &str,
        action: &ScheduleAction,
    ) -> Result<(), AdsynkError>;

    async fn delete_schedule_action(
        &self,
        channel_id: &str,
        action_name: &str,
    ) -> Result<(), AdsynkError>;
}
