// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking operations.

use adsynk_core::AdsynkError;
use adsynk_core::types::{ScheduleFilter, ScheduleRecord, ScheduleStatus};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::{is_constraint_violation, parse_column};

const SCHEDULE_COLUMNS: &str =
    "schedule_id, ad_id, schedule_time, event_name, duration, status, created_at";

fn schedule_from_row(row: &rusqlite::Row<'_>) -> Result<ScheduleRecord, rusqlite::Error> {
    Ok(ScheduleRecord {
        schedule_id: row.get(0)?,
        ad_id: row.get(1)?,
        schedule_time: row.get(2)?,
        event_name: row.get(3)?,
        duration_secs: row.get(4)?,
        status: parse_column(row, 5)?,
        created_at: row.get(6)?,
    })
}

/// Insert a new booking; a duplicate identifier is a `Conflict`.
pub async fn insert_schedule(db: &Database, schedule: &ScheduleRecord) -> Result<(), AdsynkError> {
    let schedule = schedule.clone();
    let schedule_id = schedule.schedule_id.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!(
                    "INSERT INTO schedules ({SCHEDULE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    schedule.schedule_id,
                    schedule.ad_id,
                    schedule.schedule_time,
                    schedule.event_name,
                    schedule.duration_secs,
                    schedule.status.to_string(),
                    schedule.created_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(AdsynkError::Conflict {
            message: format!("schedule `{schedule_id}` already exists"),
            active_count: None,
        })
    }
}

/// Get a booking by ID.
pub async fn get_schedule(
    db: &Database,
    schedule_id: &str,
) -> Result<Option<ScheduleRecord>, AdsynkError> {
    let schedule_id = schedule_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ScheduleRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE schedule_id = ?1"
            ))?;
            match stmt.query_row(params![schedule_id], schedule_from_row) {
                Ok(s) => Ok(Some(s)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Full scan of the bookings with the filter pushed into SQL.
pub async fn list_schedules(
    db: &Database,
    filter: &ScheduleFilter,
) -> Result<Vec<ScheduleRecord>, AdsynkError> {
    let mut sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE 1 = 1");
    let mut args: Vec<String> = Vec::new();

    if let Some(ad_id) = &filter.ad_id {
        args.push(ad_id.clone());
        sql.push_str(&format!(" AND ad_id = ?{}", args.len()));
    }
    if let Some(statuses) = &filter.statuses {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let mut placeholders = Vec::with_capacity(statuses.len());
        for status in statuses {
            args.push(status.to_string());
            placeholders.push(format!("?{}", args.len()));
        }
        sql.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
    }
    sql.push_str(" ORDER BY created_at, schedule_id");

    db.connection()
        .call(move |conn| -> Result<Vec<ScheduleRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), schedule_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Move a booking to `status`. Returns `false` if no such booking.
pub async fn update_schedule_status(
    db: &Database,
    schedule_id: &str,
    status: ScheduleStatus,
) -> Result<bool, AdsynkError> {
    let schedule_id = schedule_id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE schedules SET status = ?1 WHERE schedule_id = ?2",
                params![status, schedule_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
