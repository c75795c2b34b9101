// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the store, the analytics engine, and the
//! channel scheduler.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AdsynkError;

/// Longest window, in hours, a caller may request for log analytics.
pub const MAX_WINDOW_HOURS: u32 = 168;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    LogQuery,
    Channel,
}

// --- Inventory ---

/// Upload lifecycle of an ad creative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Ready,
    Failed,
}

/// An ad creative in the inventory collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRecord {
    pub ad_id: String,
    pub title: String,
    pub advertiser: String,
    /// Creative length in seconds.
    pub duration_secs: u32,
    /// Persisted and serialized as `"true"` / `"false"`.
    #[serde(with = "active_flag")]
    pub active: bool,
    pub upload_status: UploadStatus,
    /// ISO-8601, UTC-naive.
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Normalize a caller-supplied active flag: only a case-insensitive `true` is true.
pub fn parse_active_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

/// The persisted form of an active flag.
pub fn active_flag_str(active: bool) -> &'static str {
    if active { "true" } else { "false" }
}

/// Serde adapter storing a bool as its normalized lowercase string.
pub mod active_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::active_flag_str(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Raw::deserialize(deserializer).map(Raw::into_bool)
    }

    /// Like [`deserialize`], but an explicit `null` yields `None`.
    pub fn deserialize_optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        Option::<Raw>::deserialize(deserializer).map(|raw| raw.map(Raw::into_bool))
    }

    impl Raw {
        fn into_bool(self) -> bool {
            match self {
                Raw::Bool(b) => b,
                Raw::Text(s) => super::parse_active_flag(&s),
            }
        }
    }
}

// --- Bookings ---

/// Lifecycle status of a booking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Active,
    Completed,
    Failed,
    #[strum(serialize = "cancelled", serialize = "canceled")]
    #[serde(alias = "canceled")]
    Cancelled,
}

impl ScheduleStatus {
    /// Statuses that still hold a claim on the referenced ad.
    pub const NON_TERMINAL: [ScheduleStatus; 2] = [ScheduleStatus::Scheduled, ScheduleStatus::Active];

    /// Whether the booking is still pending or in flight.
    pub fn is_pending(self) -> bool {
        Self::NON_TERMINAL.contains(&self)
    }
}

/// A booked insertion of an ad into a live event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub schedule_id: String,
    /// Not enforced by the store; see the deletion guard.
    pub ad_id: String,
    /// ISO-8601 as supplied by the booking caller.
    pub schedule_time: String,
    pub event_name: String,
    pub duration_secs: u32,
    pub status: ScheduleStatus,
    pub created_at: String,
}

/// Server-side filter for schedule scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleFilter {
    pub ad_id: Option<String>,
    pub statuses: Option<Vec<ScheduleStatus>>,
}

impl ScheduleFilter {
    /// Every booking referencing `ad_id`.
    pub fn for_ad(ad_id: impl Into<String>) -> Self {
        Self {
            ad_id: Some(ad_id.into()),
            statuses: None,
        }
    }

    pub fn matches(&self, record: &ScheduleRecord) -> bool {
        if let Some(ad_id) = &self.ad_id
            && &record.ad_id != ad_id
        {
            return false;
        }
        match &self.statuses {
            Some(statuses) => statuses.contains(&record.status),
            None => true,
        }
    }
}

/// Result of a store-side conditional delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalDelete {
    Deleted,
    /// Refused: this many non-terminal bookings still reference the ad.
    Referenced { active_count: usize },
    Missing,
}

// --- Performance events ---

/// Kind of a raw performance event. Unknown kinds are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Insertion,
    Success,
    Failure,
    Other(String),
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "insertion" => Self::Insertion,
            "success" => Self::Success,
            "failure" => Self::Failure,
            _ => Self::Other(raw),
        }
    }
}

impl From<EventType> for String {
    fn from(kind: EventType) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insertion => f.write_str("insertion"),
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Append-only insertion telemetry for one ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvent {
    /// Absent references aggregate under `"unknown"`.
    pub ad_id: Option<String>,
    pub event_type: EventType,
    /// ISO-8601, UTC-naive.
    pub timestamp: String,
    /// Seconds; may be fractional upstream.
    pub duration: Option<f64>,
}

// --- Log queries ---

/// Status of a remote log query as reported by the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum QueryStatus {
    #[strum(serialize = "Scheduled", serialize = "Submitted")]
    #[serde(rename = "Scheduled", alias = "Submitted")]
    Submitted,
    Running,
    Complete,
    Failed,
    Cancelled,
    /// Remote-side timeout, distinct from client budget exhaustion.
    Timeout,
    Unknown,
}

impl QueryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::Cancelled | Self::Timeout
        )
    }
}

/// One named value in a result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// An ordered result row. Its schema depends on the query.
pub type ResultRow = Vec<ResultField>;

/// A half-open `[start, end)` query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AdsynkError> {
        if start >= end {
            return Err(AdsynkError::InvalidInput(format!(
                "time window start {start} must precede end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `hours` hours leading up to `end`.
    pub fn trailing_hours(end: DateTime<Utc>, hours: u32) -> Result<Self, AdsynkError> {
        if hours == 0 || hours > MAX_WINDOW_HOURS {
            return Err(AdsynkError::InvalidInput(format!(
                "hours must be between 1 and {MAX_WINDOW_HOURS}, got {hours}"
            )));
        }
        Self::new(end - TimeDelta::hours(i64::from(hours)), end)
    }

    pub fn start_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_epoch(&self) -> i64 {
        self.end.timestamp()
    }

    /// Inclusive on both ends, matching a store-side `BETWEEN`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// A query submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub log_group: String,
    pub query: String,
    pub window: TimeWindow,
}

/// What a single status poll returns.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    pub status: QueryStatus,
    pub rows: Vec<ResultRow>,
}

/// How a job ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    /// Terminal `Complete` observed.
    Complete,
    /// Poll budget exhausted; rows are best-effort.
    Partial,
    /// The log group does not exist yet.
    Empty,
    /// Terminal `Failed`/`Cancelled`/`Timeout` observed.
    Failed,
}

/// Handle to a submitted (or skipped) log query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryJob {
    /// `None` when the log group was missing and nothing was submitted.
    pub id: Option<String>,
    pub log_group: String,
    /// Last status observed from the service.
    pub status: QueryStatus,
    /// Last rows observed from the service.
    pub rows: Vec<ResultRow>,
    /// Number of status checks performed.
    pub attempts: u32,
    /// Client-side TIMEOUT: the budget ran out before a terminal status.
    pub budget_exhausted: bool,
    pub source_missing: bool,
}

impl QueryJob {
    /// A freshly submitted job.
    pub fn submitted(id: String, log_group: String) -> Self {
        Self {
            id: Some(id),
            log_group,
            status: QueryStatus::Submitted,
            rows: Vec::new(),
            attempts: 0,
            budget_exhausted: false,
            source_missing: false,
        }
    }

    /// Stand-in for a query against a log group that does not exist.
    pub fn empty_source(log_group: String) -> Self {
        Self {
            id: None,
            log_group,
            status: QueryStatus::Complete,
            rows: Vec::new(),
            attempts: 0,
            budget_exhausted: false,
            source_missing: true,
        }
    }

    pub fn outcome(&self) -> JobOutcome {
        if self.source_missing {
            JobOutcome::Empty
        } else if self.budget_exhausted {
            JobOutcome::Partial
        } else if self.status == QueryStatus::Complete {
            JobOutcome::Complete
        } else {
            JobOutcome::Failed
        }
    }
}

// --- Live channel ---

/// Summary of a live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub name: String,
    pub state: String,
}

/// A validated, wire-ready SCTE-35 splice insert action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAction {
    pub action_name: String,
    /// UTC, microsecond precision, `Z` suffix.
    pub start_time: String,
    pub splice_event_id: u32,
    pub duration_ms: u64,
}

/// Whether `name` is a usable log namespace: `[A-Za-z0-9._-]` only, not all dots.
pub fn is_valid_namespace(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().all(|c| c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

// --- Time helpers ---

/// Parse an ISO-8601 timestamp, with offset or UTC-naive, into UTC.
pub fn parse_iso_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format an instant as UTC-naive ISO-8601 with microseconds.
pub fn naive_iso(instant: DateTime<Utc>) -> String {
    instant.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Timestamp-derived identifier, e.g. `ad_20260301_101500_000123`.
pub fn timestamped_id(prefix: &str, instant: DateTime<Utc>) -> String {
    format!("{prefix}_{}", instant.format("%Y%m%d_%H%M%S_%6f"))
}
