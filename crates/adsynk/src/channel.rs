// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `adsynk channel`.

use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use serde_json::json;

use adsynk_channel::SpliceRequest;
use adsynk_core::AdsynkError;

use crate::context::AppContext;
use crate::output::print_json;

#[derive(Subcommand, Debug)]
pub enum ChannelCommand {
    /// Show a channel's name and state.
    Describe { channel_id: String },
    /// Schedule a splice insert, either for a booking or from explicit fields.
    Splice {
        channel_id: String,
        /// Derive name, time and duration from this booking.
        #[arg(long, conflicts_with_all = ["action_name", "time", "duration"])]
        schedule_id: Option<String>,
        #[arg(long)]
        action_name: Option<String>,
        /// ISO-8601 start time.
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        splice_event_id: Option<u32>,
        /// Seconds.
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Remove a scheduled splice insert.
    Remove {
        channel_id: String,
        action_name: String,
    },
}

pub async fn run_channel(
    ctx: &AppContext,
    out: &mut dyn Write,
    cmd: ChannelCommand,
) -> Result<(), AdsynkError> {
    let splicer = ctx.splicer()?;
    match cmd {
        ChannelCommand::Describe { channel_id } => {
            print_json(out, &splicer.describe_channel(&channel_id).await?)
        }
        ChannelCommand::Splice {
            channel_id,
            schedule_id: Some(schedule_id),
            splice_event_id,
            ..
        } => {
            let schedule = ctx
                .store()
                .get_schedule(&schedule_id)
                .await?
                .ok_or_else(|| AdsynkError::not_found("schedule", schedule_id.as_str()))?;
            let splice_event_id = splice_event_id.ok_or_else(|| {
                AdsynkError::InvalidInput("missing required fields: splice_event_id".to_string())
            })?;
            let action = splicer
                .schedule_booking(&channel_id, &schedule, splice_event_id)
                .await?;
            print_json(out, &action)
        }
        ChannelCommand::Splice {
            channel_id,
            schedule_id: None,
            action_name,
            time,
            splice_event_id,
            duration,
        } => {
            let request = SpliceRequest {
                action_name,
                schedule_time: time,
                splice_event_id,
                duration: duration.map(Duration::from_secs),
            };
            print_json(out, &splicer.schedule_splice(&channel_id, &request).await?)
        }
        ChannelCommand::Remove {
            channel_id,
            action_name,
        } => {
            splicer.remove_splice(&channel_id, &action_name).await?;
            print_json(
                out,
                &json!({ "channelId": channel_id, "actionName": action_name, "removed": true }),
            )
        }
    }
}
