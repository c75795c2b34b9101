// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log Insights query strings and the metric specs that read their rows.

use crate::extractor::{FieldRef, RatioSpec, ScalarSpec, StatsSpec};

pub const FILLED_AVAIL: &str = "FILLED_AVAIL";
pub const UNFILLED_AVAIL: &str = "UNFILLED_AVAIL";
pub const MAKING_ADS_REQUEST: &str = "MAKING_ADS_REQUEST";

/// Grouped count of filled avails against ad requests.
pub const SUCCESS_RATE_QUERY: &str = r#"fields @timestamp, eventType, numAds, fillRate
| filter eventType = "FILLED_AVAIL" or eventType = "MAKING_ADS_REQUEST"
| stats count() by eventType
| sort eventType"#;

/// Rows are `[eventType, count]`.
pub const SUCCESS_RATE: RatioSpec<'static> = RatioSpec {
    name: "actual_success_rate",
    key: FieldRef::Index(0),
    count: FieldRef::Index(1),
    numerator: FILLED_AVAIL,
    denominator: MAKING_ADS_REQUEST,
};

/// Average transcode duration of filled avails, in milliseconds.
pub const TRANSCODE_QUERY: &str = r#"fields @timestamp, eventType, transcodeDuration
| filter eventType = "FILLED_AVAIL" and ispresent(transcodeDuration)
| stats avg(transcodeDuration) as avgTranscode"#;

/// Reported in seconds.
pub const TRANSCODE: ScalarSpec<'static> = ScalarSpec {
    field: FieldRef::Index(0),
    divisor: 1000.0,
    places: 2,
};

/// Fill-rate statistics over filled avails.
pub const FILL_RATE_QUERY: &str = r#"fields @timestamp, eventType, fillRate
| filter eventType = "FILLED_AVAIL" and ispresent(fillRate)
| stats avg(fillRate) as avgFillRate, min(fillRate) as minFillRate, max(fillRate) as maxFillRate, count() as totalFilled"#;

pub const FILL_RATE: StatsSpec<'static> = StatsSpec {
    avg: FieldRef::Index(0),
    min: FieldRef::Index(1),
    max: FieldRef::Index(2),
    count: FieldRef::Index(3),
};

/// The most recent avail and ad-request events.
pub const DETAILED_EVENTS_QUERY: &str = r#"fields @timestamp, eventType, numAds, fillRate, filledDuration, originAvailDuration, transcodeDuration
| filter eventType = "FILLED_AVAIL" or eventType = "UNFILLED_AVAIL" or eventType = "MAKING_ADS_REQUEST"
| sort @timestamp desc
| limit 100"#;

/// Column names for [`DETAILED_EVENTS_QUERY`] rows, in order.
pub const DETAILED_EVENT_FIELDS: [&str; 7] = [
    "timestamp",
    "eventType",
    "numAds",
    "fillRate",
    "filledDuration",
    "originAvailDuration",
    "transcodeDuration",
];
