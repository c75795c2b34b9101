// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only performance event log.

use adsynk_core::AdsynkError;
use adsynk_core::types::{EventType, PerformanceEvent};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Append one event.
pub async fn append_event(db: &Database, event: &PerformanceEvent) -> Result<(), AdsynkError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO performance_events (ad_id, event_type, timestamp, duration)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    event.ad_id,
                    event.event_type.to_string(),
                    event.timestamp,
                    event.duration,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Events with `from <= timestamp <= to` (ISO string order), oldest append first.
pub async fn list_events(
    db: &Database,
    from: &str,
    to: &str,
) -> Result<Vec<PerformanceEvent>, AdsynkError> {
    let from = from.to_string();
    let to = to.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<PerformanceEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT ad_id, event_type, timestamp, duration FROM performance_events
                 WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![from, to], |row| {
                let kind: String = row.get(1)?;
                Ok(PerformanceEvent {
                    ad_id: row.get(0)?,
                    event_type: EventType::from(kind),
                    timestamp: row.get(2)?,
                    duration: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
