// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record builders and a throwaway SQLite store.

use chrono::{DateTime, TimeZone, Utc};

use adsynk_config::model::StorageConfig;
use adsynk_core::AdsynkError;
use adsynk_core::types::{
    AdRecord, EventType, PerformanceEvent, ScheduleRecord, ScheduleStatus, UploadStatus,
};
use adsynk_storage::SqliteStore;

/// A UTC instant; panics on an impossible date, which only tests pass.
pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .unwrap_or_else(|| panic!("invalid fixture date {y}-{mo}-{d} {h}:{mi}:{s}"))
}

/// An active, pending-upload 30-second ad.
pub fn ad_fixture(ad_id: &str) -> AdRecord {
    AdRecord {
        ad_id: ad_id.to_string(),
        title: format!("Title {ad_id}"),
        advertiser: format!("Advertiser {ad_id}"),
        duration_secs: 30,
        active: true,
        upload_status: UploadStatus::Pending,
        created_at: "2026-03-01T00:00:00.000000".to_string(),
        updated_at: None,
    }
}

/// A 30-second booking of `ad_id` at `schedule_time`.
pub fn schedule_fixture(
    schedule_id: &str,
    ad_id: &str,
    schedule_time: &str,
    status: ScheduleStatus,
) -> ScheduleRecord {
    ScheduleRecord {
        schedule_id: schedule_id.to_string(),
        ad_id: ad_id.to_string(),
        schedule_time: schedule_time.to_string(),
        event_name: "Fixture Match".to_string(),
        duration_secs: 30,
        status,
        created_at: "2026-03-01T00:00:00.000000".to_string(),
    }
}

/// A performance event; `kind` goes through the open event-type parser.
pub fn event_fixture(
    ad_id: Option<&str>,
    kind: &str,
    timestamp: &str,
    duration: Option<f64>,
) -> PerformanceEvent {
    PerformanceEvent {
        ad_id: ad_id.map(str::to_string),
        event_type: EventType::from(kind.to_string()),
        timestamp: timestamp.to_string(),
        duration,
    }
}

/// An initialized SQLite store in a fresh temp directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub async fn temp_sqlite_store() -> Result<(SqliteStore, tempfile::TempDir), AdsynkError> {
    let dir = tempfile::TempDir::new().map_err(AdsynkError::storage)?;
    let path = dir.path().join("adsynk-test.db");
    let store = SqliteStore::open(StorageConfig {
        database_path: path.to_string_lossy().into_owned(),
        wal_mode: true,
    })
    .await?;
    Ok((store, dir))
}
