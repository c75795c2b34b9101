// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-ad performance aggregation and CSV export.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use tracing::info;

use adsynk_core::types::{AdRecord, EventType, PerformanceEvent};
use adsynk_core::{AdStore, AdsynkError};

use crate::extractor::round_to;

/// Fixed column labels of the export.
pub const CSV_HEADER: [&str; 8] = [
    "광고ID",
    "광고명",
    "광고사업자",
    "삽입횟수",
    "성공횟수",
    "실패횟수",
    "성공률(%)",
    "총지속시간(초)",
];

const UNKNOWN_AD: &str = "unknown";
const UNKNOWN_META: &str = "Unknown";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Success rate of one ad. Rendered as `0` when there were no insertions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuccessRate {
    NoInsertions,
    Percent(f64),
}

impl fmt::Display for SuccessRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInsertions => f.write_str("0"),
            Self::Percent(rate) => write!(f, "{rate:.1}"),
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct AdPerformanceRow {
    pub ad_id: String,
    pub title: String,
    pub advertiser: String,
    pub insertions: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: SuccessRate,
    /// Whole seconds; each event's duration is truncated before summing.
    pub total_duration: i64,
}

impl AdPerformanceRow {
    fn record(&self) -> [String; 8] {
        [
            self.ad_id.clone(),
            self.title.clone(),
            self.advertiser.clone(),
            self.insertions.to_string(),
            self.successes.to_string(),
            self.failures.to_string(),
            self.success_rate.to_string(),
            self.total_duration.to_string(),
        ]
    }
}

#[derive(Default)]
struct Tally {
    insertions: u64,
    successes: u64,
    failures: u64,
    duration: i64,
}

/// Group `events` by ad and join each group with `inventory`.
///
/// Rows come out in first-occurrence order of the input events. No other
/// ordering is guaranteed; sort afterwards if a stable order matters.
pub fn aggregate(
    events: &[PerformanceEvent],
    inventory: &HashMap<String, AdRecord>,
) -> Vec<AdPerformanceRow> {
    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for event in events {
        let ad_id = event.ad_id.as_deref().unwrap_or(UNKNOWN_AD);
        let tally = tallies.entry(ad_id.to_string()).or_insert_with(|| {
            order.push(ad_id.to_string());
            Tally::default()
        });
        match event.event_type {
            EventType::Insertion => tally.insertions += 1,
            EventType::Success => tally.successes += 1,
            EventType::Failure => tally.failures += 1,
            EventType::Other(_) => {}
        }
        if let Some(duration) = event.duration.filter(|d| d.is_finite()) {
            tally.duration += duration.trunc() as i64;
        }
    }

    order
        .into_iter()
        .filter_map(|ad_id| {
            let tally = tallies.remove(&ad_id)?;
            let (title, advertiser) = match inventory.get(&ad_id) {
                Some(ad) => (ad.title.clone(), ad.advertiser.clone()),
                None => (UNKNOWN_META.to_string(), UNKNOWN_META.to_string()),
            };
            let success_rate = if tally.insertions == 0 {
                SuccessRate::NoInsertions
            } else {
                SuccessRate::Percent(round_to(
                    tally.successes as f64 / tally.insertions as f64 * 100.0,
                    1,
                ))
            };
            Some(AdPerformanceRow {
                ad_id,
                title,
                advertiser,
                insertions: tally.insertions,
                successes: tally.successes,
                failures: tally.failures,
                success_rate,
                total_duration: tally.duration,
            })
        })
        .collect()
}

/// Serialize `rows` under [`CSV_HEADER`], UTF-8 with CRLF line endings.
pub fn to_csv(rows: &[AdPerformanceRow]) -> Result<String, AdsynkError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row.record()).map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AdsynkError::Internal(format!("csv flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AdsynkError::Internal(format!("csv not utf-8: {e}")))
}

fn csv_error(e: csv::Error) -> AdsynkError {
    AdsynkError::Internal(format!("csv write failed: {e}"))
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Suggested download name, `ad_analytics_<start>_to_<end>.csv`.
    pub file_name: String,
    pub content: String,
    pub rows: usize,
}

/// Pulls events and inventory from the store and renders the CSV.
#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn AdStore>,
    lookback_days: u32,
}

impl ExportService {
    pub fn new(store: Arc<dyn AdStore>, lookback_days: u32) -> Self {
        Self {
            store,
            lookback_days,
        }
    }

    /// Export events from `start` 00:00:00 through `end` 23:59:59.
    ///
    /// Dates are `YYYY-MM-DD`. `end` defaults to `today`, `start` to
    /// `today` minus the lookback.
    pub async fn export(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<CsvExport, AdsynkError> {
        let start = match start {
            Some(raw) => parse_date("start", raw)?,
            None => today - TimeDelta::days(i64::from(self.lookback_days)),
        };
        let end = match end {
            Some(raw) => parse_date("end", raw)?,
            None => today,
        };
        if start > end {
            return Err(AdsynkError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let start_label = start.format(DATE_FORMAT).to_string();
        let end_label = end.format(DATE_FORMAT).to_string();
        let events = self
            .store
            .list_events(
                &format!("{start_label}T00:00:00"),
                &format!("{end_label}T23:59:59"),
            )
            .await?;
        let inventory: HashMap<String, AdRecord> = self
            .store
            .list_ads()
            .await?
            .into_iter()
            .map(|ad| (ad.ad_id.clone(), ad))
            .collect();

        let rows = aggregate(&events, &inventory);
        let content = to_csv(&rows)?;
        info!(
            start = %start_label,
            end = %end_label,
            events = events.len(),
            rows = rows.len(),
            "performance export generated"
        );
        Ok(CsvExport {
            file_name: format!("ad_analytics_{start_label}_to_{end_label}.csv"),
            content,
            rows: rows.len(),
        })
    }
}

fn parse_date(which: &str, raw: &str) -> Result<NaiveDate, AdsynkError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        AdsynkError::InvalidInput(format!("{which} date `{raw}` is not YYYY-MM-DD"))
    })
}
