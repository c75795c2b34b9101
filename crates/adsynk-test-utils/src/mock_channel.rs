// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory live channel for deterministic testing.
//!
//! Unknown channels and actions answer NotFound; reusing an action name on a
//! channel answers Conflict, the same way the real scheduling API does.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use adsynk_core::types::{AdapterType, ChannelInfo, HealthStatus, ScheduleAction};
use adsynk_core::{AdsynkError, ChannelScheduler, PluginAdapter};

#[derive(Default)]
struct State {
    channels: HashMap<String, ChannelInfo>,
    actions: HashMap<String, Vec<ScheduleAction>>,
}

/// A live channel whose schedule is held in memory.
#[derive(Default)]
pub struct MockChannel {
    state: Mutex<State>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel that `describe_channel` and the schedule calls accept.
    pub fn with_channel(mut self, channel_id: &str, name: &str, state: &str) -> Self {
        self.state.get_mut().channels.insert(
            channel_id.to_string(),
            ChannelInfo {
                channel_id: channel_id.to_string(),
                name: name.to_string(),
                state: state.to_string(),
            },
        );
        self
    }

    /// Actions currently scheduled on `channel_id`.
    pub async fn actions(&self, channel_id: &str) -> Vec<ScheduleAction> {
        self.state
            .lock()
            .await
            .actions
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn channel_missing(channel_id: &str) -> AdsynkError {
    AdsynkError::not_found("channel", channel_id)
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, AdsynkError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelScheduler for MockChannel {
    async fn describe_channel(&self, channel_id: &str) -> Result<ChannelInfo, AdsynkError> {
        self.state
            .lock()
            .await
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| channel_missing(channel_id))
    }

    async fn create_schedule_action(
        &self,
        channel_id: &str,
        action: &ScheduleAction,
    ) -> Result<(), AdsynkError> {
        let mut state = self.state.lock().await;
        if !state.channels.contains_key(channel_id) {
            return Err(channel_missing(channel_id));
        }
        let actions = state.actions.entry(channel_id.to_string()).or_default();
        if actions.iter().any(|a| a.action_name == action.action_name) {
            return Err(AdsynkError::Conflict {
                message: format!("action `{}` already exists", action.action_name),
                active_count: None,
            });
        }
        actions.push(action.clone());
        Ok(())
    }

    async fn delete_schedule_action(
        &self,
        channel_id: &str,
        action_name: &str,
    ) -> Result<(), AdsynkError> {
        let mut state = self.state.lock().await;
        if !state.channels.contains_key(channel_id) {
            return Err(channel_missing(channel_id));
        }
        let actions = state.actions.entry(channel_id.to_string()).or_default();
        let before = actions.len();
        actions.retain(|a| a.action_name != action_name);
        if actions.len() == before {
            return Err(AdsynkError::not_found("schedule action", action_name));
        }
        Ok(())
    }
}
