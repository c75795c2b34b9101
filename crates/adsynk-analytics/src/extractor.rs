// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn terminal query rows into numeric metrics.
//!
//! Nothing here fails on malformed input. A row that is too short, or a value
//! that does not parse as a number, simply contributes nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use adsynk_core::types::ResultRow;

/// Addresses a field by column position or by column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Index(usize),
    Name(&'a str),
}

/// Raw value of `field` in `row`, if present.
pub fn field_value<'r>(row: &'r ResultRow, field: FieldRef<'_>) -> Option<&'r str> {
    match field {
        FieldRef::Index(i) => row.get(i).map(|f| f.value.as_str()),
        FieldRef::Name(name) => row
            .iter()
            .find(|f| f.field == name)
            .map(|f| f.value.as_str()),
    }
}

/// Numeric value of `field` in `row`; non-numeric values count as absent.
pub fn numeric(row: &ResultRow, field: FieldRef<'_>) -> Option<f64> {
    field_value(row, field)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// A ratio between two categories of a grouped-count result.
#[derive(Debug, Clone, Copy)]
pub struct RatioSpec<'a> {
    /// Name of the metric, for logging.
    pub name: &'a str,
    pub key: FieldRef<'a>,
    pub count: FieldRef<'a>,
    pub numerator: &'a str,
    pub denominator: &'a str,
}

/// `numerator / denominator * 100`, rounded to 1 decimal and clamped to `[0, 100]`.
///
/// A zero (or absent) denominator yields `0.0`.
pub fn ratio_metric(rows: &[ResultRow], spec: &RatioSpec<'_>) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for row in rows {
        let (Some(key), Some(count)) = (field_value(row, spec.key), numeric(row, spec.count))
        else {
            continue;
        };
        if key == spec.numerator {
            numerator += count;
        } else if key == spec.denominator {
            denominator += count;
        }
    }
    percentage(spec.name, numerator, denominator)
}

/// `part / whole * 100` with the same rounding and clamping as [`ratio_metric`].
pub fn percentage(name: &str, part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    let raw = part / whole * 100.0;
    if !(0.0..=100.0).contains(&raw) {
        warn!(metric = name, part, whole, raw, "ratio out of range, clamping");
    }
    round_to(raw.clamp(0.0, 100.0), 1)
}

/// A single aggregate value from the first row.
#[derive(Debug, Clone, Copy)]
pub struct ScalarSpec<'a> {
    pub field: FieldRef<'a>,
    /// Unit conversion, e.g. `1000.0` for milliseconds to seconds.
    pub divisor: f64,
    pub places: u32,
}

/// The first row's value of `spec.field`, converted and rounded; `0.0` when absent.
pub fn scalar_metric(rows: &[ResultRow], spec: &ScalarSpec<'_>) -> f64 {
    rows.first()
        .and_then(|row| numeric(row, spec.field))
        .map(|v| round_to(v / spec.divisor, spec.places))
        .unwrap_or(0.0)
}

/// Which fields of an aggregate row hold avg/min/max/count.
#[derive(Debug, Clone, Copy)]
pub struct StatsSpec<'a> {
    pub avg: FieldRef<'a>,
    pub min: FieldRef<'a>,
    pub max: FieldRef<'a>,
    pub count: FieldRef<'a>,
}

/// Fill-rate statistics. Every field is present in every report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FillStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// avg/min/max rounded to 3 decimals and an integer count; all zero when absent.
pub fn stats_metric(rows: &[ResultRow], spec: &StatsSpec<'_>) -> FillStats {
    let Some(row) = rows.first() else {
        return FillStats::default();
    };
    let stat = |field| numeric(row, field).map(|v| round_to(v, 3)).unwrap_or(0.0);
    FillStats {
        avg: stat(spec.avg),
        min: stat(spec.min),
        max: stat(spec.max),
        count: numeric(row, spec.count)
            .filter(|v| *v >= 0.0)
            .map(|v| v.trunc() as u64)
            .unwrap_or(0),
    }
}

/// Map `names` onto `row` position-wise. Names past the row's end are omitted.
pub fn project_row(row: &ResultRow, names: &[&str]) -> BTreeMap<String, String> {
    names
        .iter()
        .zip(row.iter())
        .map(|(name, field)| ((*name).to_string(), field.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::ResultField;
    use proptest::prelude::*;

    fn row(pairs: &[(&str, &str)]) -> ResultRow {
        pairs.iter().map(|(f, v)| ResultField::new(*f, *v)).collect()
    }

    const SUCCESS: RatioSpec<'static> = RatioSpec {
        name: "success_rate",
        key: FieldRef::Index(0),
        count: FieldRef::Index(1),
        numerator: "FILLED_AVAIL",
        denominator: "MAKING_ADS_REQUEST",
    };

    fn grouped(filled: &str, requested: &str) -> Vec<ResultRow> {
        vec![
            row(&[("eventType", "FILLED_AVAIL"), ("count()", filled)]),
            row(&[("eventType", "MAKING_ADS_REQUEST"), ("count()", requested)]),
        ]
    }

    #[test]
    fn ratio_of_grouped_counts() {
        assert_eq!(ratio_metric(&grouped("7", "10"), &SUCCESS), 70.0);
        assert_eq!(ratio_metric(&grouped("2", "3"), &SUCCESS), 66.7);
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        assert_eq!(ratio_metric(&grouped("5", "0"), &SUCCESS), 0.0);
        let only_filled = vec![row(&[("eventType", "FILLED_AVAIL"), ("count()", "5")])];
        assert_eq!(ratio_metric(&only_filled, &SUCCESS), 0.0);
        assert_eq!(ratio_metric(&[], &SUCCESS), 0.0);
    }

    #[test]
    fn ratio_is_clamped_when_numerator_exceeds_denominator() {
        assert_eq!(ratio_metric(&grouped("12", "10"), &SUCCESS), 100.0);
    }

    #[test]
    fn ratio_skips_short_and_malformed_rows() {
        let rows = vec![
            row(&[("eventType", "FILLED_AVAIL")]),
            row(&[("eventType", "FILLED_AVAIL"), ("count()", "n/a")]),
            row(&[("eventType", "FILLED_AVAIL"), ("count()", "1")]),
            row(&[("eventType", "MAKING_ADS_REQUEST"), ("count()", "4")]),
        ];
        assert_eq!(ratio_metric(&rows, &SUCCESS), 25.0);
    }

    #[test]
    fn ratio_by_field_name() {
        let spec = RatioSpec {
            key: FieldRef::Name("eventType"),
            count: FieldRef::Name("count()"),
            ..SUCCESS
        };
        let rows = vec![
            row(&[("count()", "10"), ("eventType", "MAKING_ADS_REQUEST")]),
            row(&[("count()", "9"), ("eventType", "FILLED_AVAIL")]),
        ];
        assert_eq!(ratio_metric(&rows, &spec), 90.0);
    }

    #[test]
    fn scalar_converts_milliseconds() {
        let spec = ScalarSpec {
            field: FieldRef::Index(0),
            divisor: 1000.0,
            places: 2,
        };
        let rows = vec![row(&[("avgTranscode", "1234.5")])];
        assert_eq!(scalar_metric(&rows, &spec), 1.23);
        assert_eq!(scalar_metric(&[], &spec), 0.0);
        assert_eq!(scalar_metric(&[row(&[])], &spec), 0.0);
    }

    #[test]
    fn stats_bundle_rounds_and_defaults() {
        let spec = StatsSpec {
            avg: FieldRef::Name("avgFillRate"),
            min: FieldRef::Name("minFillRate"),
            max: FieldRef::Name("maxFillRate"),
            count: FieldRef::Name("totalFilled"),
        };
        let rows = vec![row(&[
            ("avgFillRate", "0.87654"),
            ("minFillRate", "0.5"),
            ("maxFillRate", "1"),
            ("totalFilled", "42"),
        ])];
        let stats = stats_metric(&rows, &spec);
        assert_eq!(
            stats,
            FillStats {
                avg: 0.877,
                min: 0.5,
                max: 1.0,
                count: 42
            }
        );
        assert_eq!(stats_metric(&[], &spec), FillStats::default());

        let partial = vec![row(&[("avgFillRate", "0.9")])];
        let stats = stats_metric(&partial, &spec);
        assert_eq!(stats.avg, 0.9);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn projection_omits_missing_columns() {
        let r = row(&[("@timestamp", "2026-03-01 00:00:00.000"), ("eventType", "FILLED_AVAIL")]);
        let projected = project_row(&r, &["timestamp", "eventType", "numAds"]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["timestamp"], "2026-03-01 00:00:00.000");
        assert!(!projected.contains_key("numAds"));
    }

    proptest! {
        #[test]
        fn ratio_stays_in_range(requested in 1u32..100_000, frac in 0.0f64..=1.0) {
            let filled = (f64::from(requested) * frac).floor() as u32;
            let rows = grouped(&filled.to_string(), &requested.to_string());
            let rate = ratio_metric(&rows, &SUCCESS);
            prop_assert!((0.0..=100.0).contains(&rate));
            let expected = round_to(f64::from(filled) / f64::from(requested) * 100.0, 1);
            prop_assert_eq!(rate, expected);
        }

        #[test]
        fn round_to_is_idempotent(v in -1.0e6f64..1.0e6, places in 0u32..4) {
            let once = round_to(v, places);
            prop_assert_eq!(round_to(once, places), once);
        }
    }
}
