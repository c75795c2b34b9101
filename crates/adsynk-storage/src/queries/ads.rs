// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ad inventory operations.

use adsynk_core::AdsynkError;
use adsynk_core::types::{
    AdRecord, ConditionalDelete, ScheduleStatus, active_flag_str, parse_active_flag,
};
use rusqlite::{TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{is_constraint_violation, parse_column};

const AD_COLUMNS: &str =
    "ad_id, title, advertiser, duration, active, upload_status, created_at, updated_at";

fn ad_from_row(row: &rusqlite::Row<'_>) -> Result<AdRecord, rusqlite::Error> {
    let active: String = row.get(4)?;
    Ok(AdRecord {
        ad_id: row.get(0)?,
        title: row.get(1)?,
        advertiser: row.get(2)?,
        duration_secs: row.get(3)?,
        active: parse_active_flag(&active),
        upload_status: parse_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a new ad; a duplicate identifier is a `Conflict`.
pub async fn insert_ad(db: &Database, ad: &AdRecord) -> Result<(), AdsynkError> {
    let ad = ad.clone();
    let ad_id = ad.ad_id.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!("INSERT INTO ads ({AD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    ad.ad_id,
                    ad.title,
                    ad.advertiser,
                    ad.duration_secs,
                    active_flag_str(ad.active),
                    ad.upload_status.to_string(),
                    ad.created_at,
                    ad.updated_at,
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
            message: format!("ad `{ad_id}` already exists"),
            active_count: None,
        })
    }
}

/// Get an ad by ID.
pub async fn get_ad(db: &Database, ad_id: &str) -> Result<Option<AdRecord>, AdsynkError> {
    let ad_id = ad_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<AdRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!("SELECT {AD_COLUMNS} FROM ads WHERE ad_id = ?1"))?;
            match stmt.query_row(params![ad_id], ad_from_row) {
                Ok(ad) => Ok(Some(ad)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Full inventory scan, oldest first.
pub async fn list_ads(db: &Database) -> Result<Vec<AdRecord>, AdsynkError> {
    db.connection()
        .call(|conn| -> Result<Vec<AdRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {AD_COLUMNS} FROM ads ORDER BY created_at, ad_id"
            ))?;
            let rows = stmt.query_map([], ad_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Set the active flag and `updated_at`. Returns `false` if no such ad.
pub async fn update_ad_active(
    db: &Database,
    ad_id: &str,
    active: bool,
    updated_at: &str,
) -> Result<bool, AdsynkError> {
    let ad_id = ad_id.to_string();
    let updated_at = updated_at.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE ads SET active = ?1, updated_at = ?2 WHERE ad_id = ?3",
                params![active_flag_str(active), updated_at, ad_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the ad unless a `scheduled`/`active` booking references it.
///
/// The delete itself is one `DELETE ... WHERE NOT EXISTS` statement; it runs
/// inside an immediate transaction so the follow-up classification reads the
/// same snapshot.
pub async fn delete_ad_unless_referenced(
    db: &Database,
    ad_id: &str,
) -> Result<ConditionalDelete, AdsynkError> {
    let ad_id = ad_id.to_string();
    let [pending_a, pending_b] = ScheduleStatus::NON_TERMINAL.map(|s| s.to_string());
    db.connection()
        .call(move |conn| -> Result<ConditionalDelete, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let deleted = tx.execute(
                "DELETE FROM ads WHERE ad_id = ?1 AND NOT EXISTS (
                     SELECT 1 FROM schedules WHERE ad_id = ?1 AND status IN (?2, ?3)
                 )",
                params![ad_id, pending_a, pending_b],
            )?;

            let outcome = if deleted > 0 {
                ConditionalDelete::Deleted
            } else {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS (SELECT 1 FROM ads WHERE ad_id = ?1)",
                    params![ad_id],
                    |row| row.get(0),
                )?;
                if exists {
                    let active_count: usize = tx.query_row(
                        "SELECT COUNT(*) FROM schedules WHERE ad_id = ?1 AND status IN (?2, ?3)",
                        params![ad_id, pending_a, pending_b],
                        |row| row.get(0),
                    )?;
                    ConditionalDelete::Referenced { active_count }
                } else {
                    ConditionalDelete::Missing
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}
