// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `adsynk ads`, `adsynk schedules` and `adsynk events`.

use std::io::Write;

use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use adsynk_core::AdsynkError;
use adsynk_core::types::{EventType, PerformanceEvent, ScheduleStatus, naive_iso, parse_active_flag};
use adsynk_inventory::{GuardDecision, NewAd, NewSchedule};

use crate::context::AppContext;
use crate::output::print_json;

#[derive(Subcommand, Debug)]
pub enum AdsCommand {
    /// List every ad.
    List,
    /// Add an ad to the inventory.
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        advertiser: String,
        /// Seconds (default 30).
        #[arg(long)]
        duration: Option<u32>,
        /// Only a case-insensitive `true` enables the ad (default true).
        #[arg(long)]
        active: Option<String>,
    },
    /// Enable or disable an ad.
    SetActive {
        ad_id: String,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Delete an ad that no pending booking references.
    Delete { ad_id: String },
    /// Report whether an ad could be deleted right now.
    CanDelete { ad_id: String },
}

#[derive(Subcommand, Debug)]
pub enum SchedulesCommand {
    /// List bookings, optionally for one ad.
    List {
        #[arg(long)]
        ad_id: Option<String>,
    },
    /// Book an ad into a live event.
    Create {
        #[arg(long)]
        ad_id: String,
        /// ISO-8601 insertion time.
        #[arg(long)]
        time: String,
        #[arg(long)]
        event: String,
        /// Seconds (default 30).
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Move a booking to a new status.
    SetStatus { schedule_id: String, status: String },
}

#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// Append a performance event.
    Record {
        #[arg(long)]
        ad_id: Option<String>,
        /// `insertion`, `success`, `failure` or any other kind.
        #[arg(long = "type")]
        event_type: String,
        /// ISO-8601 (default now).
        #[arg(long)]
        timestamp: Option<String>,
        /// Seconds.
        #[arg(long)]
        duration: Option<f64>,
    },
}

pub async fn run_ads(ctx: &AppContext, out: &mut dyn Write, cmd: AdsCommand) -> Result<(), AdsynkError> {
    let inventory = ctx.inventory();
    match cmd {
        AdsCommand::List => print_json(out, &inventory.list_ads().await?),
        AdsCommand::Create {
            title,
            advertiser,
            duration,
            active,
        } => {
            let ad = inventory
                .create_ad(NewAd {
                    title,
                    advertiser,
                    duration_secs: duration,
                    active: active.as_deref().map(parse_active_flag),
                })
                .await?;
            print_json(out, &ad)
        }
        AdsCommand::SetActive { ad_id, active } => {
            print_json(out, &inventory.set_ad_active(&ad_id, active).await?)
        }
        AdsCommand::Delete { ad_id } => {
            inventory.delete_ad(&ad_id).await?;
            print_json(out, &json!({ "adId": ad_id, "deleted": true }))
        }
        AdsCommand::CanDelete { ad_id } => {
            let decision = inventory.guard().can_delete(&ad_id).await?;
            let active_count = match decision {
                GuardDecision::Allowed => 0,
                GuardDecision::Denied { active_count } => active_count,
            };
            print_json(
                out,
                &json!({
                    "adId": ad_id,
                    "allowed": decision == GuardDecision::Allowed,
                    "activeCount": active_count,
                }),
            )
        }
    }
}

pub async fn run_schedules(
    ctx: &AppContext,
    out: &mut dyn Write,
    cmd: SchedulesCommand,
) -> Result<(), AdsynkError> {
    let inventory = ctx.inventory();
    match cmd {
        SchedulesCommand::List { ad_id } => {
            print_json(out, &inventory.list_schedules(ad_id.as_deref()).await?)
        }
        SchedulesCommand::Create {
            ad_id,
            time,
            event,
            duration,
        } => {
            let schedule = inventory
                .create_schedule(NewSchedule {
                    ad_id,
                    schedule_time: time,
                    event_name: event,
                    duration_secs: duration,
                })
                .await?;
            print_json(out, &schedule)
        }
        SchedulesCommand::SetStatus {
            schedule_id,
            status,
        } => {
            let status: ScheduleStatus = status.trim().to_ascii_lowercase().parse().map_err(|_| {
                AdsynkError::InvalidInput(format!(
                    "unknown schedule status `{status}`; expected scheduled, active, completed, failed or cancelled"
                ))
            })?;
            print_json(out, &inventory.set_schedule_status(&schedule_id, status).await?)
        }
    }
}

pub async fn run_events(
    ctx: &AppContext,
    out: &mut dyn Write,
    cmd: EventsCommand,
) -> Result<(), AdsynkError> {
    match cmd {
        EventsCommand::Record {
            ad_id,
            event_type,
            timestamp,
            duration,
        } => {
            let event = PerformanceEvent {
                ad_id,
                event_type: EventType::from(event_type),
                timestamp: timestamp.unwrap_or_else(|| naive_iso(Utc::now())),
                duration,
            };
            ctx.inventory().record_event(event.clone()).await?;
            print_json(out, &event)
        }
    }
}
