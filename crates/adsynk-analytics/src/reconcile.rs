// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation reports: what the logs say happened next to what the
//! booking store says should have happened.
//!
//! The three log metrics and the store read run concurrently. A log metric
//! that fails is reported as zero with a `failed` outcome; it never voids the
//! others. A store failure fails the whole report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use adsynk_core::types::{
    JobOutcome, QueryJob, ScheduleFilter, ScheduleStatus, TimeWindow, parse_iso_utc,
};
use adsynk_core::{AdStore, AdsynkError};

use crate::extractor::{percentage, ratio_metric, scalar_metric, stats_metric};
use crate::poller::QueryPoller;
use crate::queries;
use crate::settings::AnalyticsSettings;

/// The window a report covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub hours: f64,
}

impl From<TimeWindow> for TimeRange {
    fn from(window: TimeWindow) -> Self {
        let secs = (window.end - window.start).num_seconds() as f64;
        Self {
            start_time: window.start,
            end_time: window.end,
            hours: secs / 3600.0,
        }
    }
}

/// Numeric metrics. Every field is present, zero when there is no data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    /// Filled avails over ad requests, from the logs.
    pub actual_success_rate: f64,
    /// Seconds.
    pub avg_transcode_time: f64,
    pub avg_fill_rate: f64,
    pub min_fill_rate: f64,
    pub max_fill_rate: f64,
    pub total_filled_avails: u64,
    /// Completed bookings over all bookings in the window, from the store.
    pub schedule_success_rate: f64,
}

/// Error detail attached to a failed metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricError {
    pub kind: String,
    pub message: String,
}

/// How one log metric was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOutcome {
    pub status: JobOutcome,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MetricError>,
}

impl MetricOutcome {
    fn from_job(job: &QueryJob) -> Self {
        Self {
            status: job.outcome(),
            attempts: job.attempts,
            error: None,
        }
    }

    fn from_error(err: &AdsynkError, secrets: &[String]) -> Self {
        Self {
            status: JobOutcome::Failed,
            attempts: 0,
            error: Some(MetricError {
                kind: err.kind().to_string(),
                message: err.boundary_message(secrets),
            }),
        }
    }
}

/// Per-metric outcomes, keyed like the metrics they produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOutcomes {
    pub success_rate: MetricOutcome,
    pub transcode_time: MetricOutcome,
    pub fill_rate: MetricOutcome,
}

impl MetricOutcomes {
    /// True when any log metric is partial, failed, or from a missing group.
    pub fn is_degraded(&self) -> bool {
        [&self.success_rate, &self.transcode_time, &self.fill_rate]
            .iter()
            .any(|o| o.status != JobOutcome::Complete)
    }
}

/// A reconciliation report for one window and one log group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReport {
    pub time_range: TimeRange,
    pub log_group_name: String,
    pub metrics: ReportMetrics,
    pub outcomes: MetricOutcomes,
    pub generated_at: DateTime<Utc>,
}

/// Builds [`MetricReport`]s from the log service and the booking store.
#[derive(Clone)]
pub struct ReconciliationEngine {
    poller: QueryPoller,
    store: Arc<dyn AdStore>,
    settings: AnalyticsSettings,
    secrets: Vec<String>,
}

impl ReconciliationEngine {
    pub fn new(poller: QueryPoller, store: Arc<dyn AdStore>, settings: AnalyticsSettings) -> Self {
        Self {
            poller,
            store,
            settings,
            secrets: Vec::new(),
        }
    }

    /// Values masked in any error message a report carries.
    pub fn with_secrets(mut self, secrets: Vec<String>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Report over `window` for the log group of `config_name`.
    pub async fn build_report(
        &self,
        window: TimeWindow,
        config_name: Option<&str>,
    ) -> Result<MetricReport, AdsynkError> {
        let log_group = self.settings.naming.resolve(config_name)?;
        let window = TimeWindow::new(window.start, window.end)?;
        let policy = self.settings.routine;

        let (success, transcode, fill, schedule_rate) = tokio::join!(
            self.poller
                .run(&log_group, queries::SUCCESS_RATE_QUERY, window, policy),
            self.poller
                .run(&log_group, queries::TRANSCODE_QUERY, window, policy),
            self.poller
                .run(&log_group, queries::FILL_RATE_QUERY, window, policy),
            self.schedule_completion_ratio(window),
        );
        let schedule_success_rate = schedule_rate?;

        let (actual_success_rate, success_outcome) = self.settle("success_rate", success, |job| {
            ratio_metric(&job.rows, &queries::SUCCESS_RATE)
        });
        let (avg_transcode_time, transcode_outcome) =
            self.settle("transcode_time", transcode, |job| {
                scalar_metric(&job.rows, &queries::TRANSCODE)
            });
        let (fill, fill_outcome) = self.settle("fill_rate", fill, |job| {
            stats_metric(&job.rows, &queries::FILL_RATE)
        });

        let report = MetricReport {
            time_range: window.into(),
            log_group_name: log_group,
            metrics: ReportMetrics {
                actual_success_rate,
                avg_transcode_time,
                avg_fill_rate: fill.avg,
                min_fill_rate: fill.min,
                max_fill_rate: fill.max,
                total_filled_avails: fill.count,
                schedule_success_rate,
            },
            outcomes: MetricOutcomes {
                success_rate: success_outcome,
                transcode_time: transcode_outcome,
                fill_rate: fill_outcome,
            },
            generated_at: Utc::now(),
        };
        info!(
            log_group = %report.log_group_name,
            actual_success_rate = report.metrics.actual_success_rate,
            schedule_success_rate = report.metrics.schedule_success_rate,
            degraded = report.outcomes.is_degraded(),
            "reconciliation report built"
        );
        Ok(report)
    }

    /// Report over `[now - hours, now)`; `hours` defaults to 1 and must be in `1..=168`.
    pub async fn realtime_report(
        &self,
        now: DateTime<Utc>,
        hours: Option<u32>,
        config_name: Option<&str>,
    ) -> Result<MetricReport, AdsynkError> {
        let window = TimeWindow::trailing_hours(now, hours.unwrap_or(1))?;
        self.build_report(window, config_name).await
    }

    /// Completed bookings over all bookings scheduled inside `window`.
    ///
    /// Both ends of the window are inclusive. Bookings whose time does not
    /// parse count toward neither side.
    pub async fn schedule_completion_ratio(&self, window: TimeWindow) -> Result<f64, AdsynkError> {
        let schedules = self.store.list_schedules(&ScheduleFilter::default()).await?;

        let mut total = 0u32;
        let mut completed = 0u32;
        for schedule in &schedules {
            let Some(at) = parse_iso_utc(&schedule.schedule_time) else {
                debug!(
                    schedule_id = %schedule.schedule_id,
                    schedule_time = %schedule.schedule_time,
                    "skipping booking with unparsable schedule time"
                );
                continue;
            };
            if !window.contains(at) {
                continue;
            }
            total += 1;
            if schedule.status == ScheduleStatus::Completed {
                completed += 1;
            }
        }

        Ok(percentage(
            "schedule_success_rate",
            f64::from(completed),
            f64::from(total),
        ))
    }

    fn settle<T: Default>(
        &self,
        metric: &str,
        result: Result<QueryJob, AdsynkError>,
        extract: impl FnOnce(&QueryJob) -> T,
    ) -> (T, MetricOutcome) {
        match result {
            Ok(job) => (extract(&job), MetricOutcome::from_job(&job)),
            Err(e) => {
                warn!(metric, error = %e.boundary_message(&self.secrets), "metric query failed, reporting zero");
                (T::default(), MetricOutcome::from_error(&e, &self.secrets))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::QueryStatus;
    use adsynk_test_utils::fixtures::{schedule_fixture, utc};
    use adsynk_test_utils::mock_log::{row, snapshot};
    use adsynk_test_utils::{MemoryStore, MockLogService, RecordingSleeper};

    fn engine(log: MockLogService, store: Arc<MemoryStore>) -> ReconciliationEngine {
        let poller = QueryPoller::new(Arc::new(log), Arc::new(RecordingSleeper::new()));
        ReconciliationEngine::new(poller, store, AnalyticsSettings::default())
    }

    fn hour() -> TimeWindow {
        TimeWindow::new(utc(2026, 3, 1, 0, 0, 0), utc(2026, 3, 1, 1, 0, 0)).unwrap()
    }

    #[tokio::test]
    async fn schedule_ratio_uses_inclusive_window() {
        let store = Arc::new(MemoryStore::new());
        for (id, time, status) in [
            ("s1", "2026-03-01T00:00:00", ScheduleStatus::Completed),
            ("s2", "2026-03-01T01:00:00Z", ScheduleStatus::Scheduled),
            ("s3", "2026-03-01T00:30:00+00:00", ScheduleStatus::Completed),
            ("s4", "2026-03-01T02:00:00", ScheduleStatus::Completed),
            ("s5", "not a time", ScheduleStatus::Completed),
        ] {
            store
                .insert_schedule(&schedule_fixture(id, "ad_1", time, status))
                .await
                .unwrap();
        }
        let engine = engine(MockLogService::new(), store);
        assert_eq!(engine.schedule_completion_ratio(hour()).await.unwrap(), 66.7);
    }

    #[tokio::test]
    async fn schedule_ratio_empty_window_is_zero() {
        let engine = engine(MockLogService::new(), Arc::new(MemoryStore::new()));
        assert_eq!(engine.schedule_completion_ratio(hour()).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn failed_metric_does_not_void_others() {
        let log = MockLogService::new()
            .with_submit_failure("transcodeDuration", "throttled")
            .with_script(
                "count() by eventType",
                vec![snapshot(
                    QueryStatus::Complete,
                    vec![
                        row(&[("eventType", "FILLED_AVAIL"), ("count()", "8")]),
                        row(&[("eventType", "MAKING_ADS_REQUEST"), ("count()", "10")]),
                    ],
                )],
            );
        let engine = engine(log, Arc::new(MemoryStore::new()));
        let report = engine.build_report(hour(), None).await.unwrap();

        assert_eq!(report.metrics.actual_success_rate, 80.0);
        assert_eq!(report.metrics.avg_transcode_time, 0.0);
        assert_eq!(report.outcomes.success_rate.status, JobOutcome::Complete);
        assert_eq!(report.outcomes.transcode_time.status, JobOutcome::Failed);
        let error = report.outcomes.transcode_time.error.as_ref().unwrap();
        assert_eq!(error.kind, "upstream_failure");
        assert!(error.message.contains("throttled"));
        assert!(report.outcomes.is_degraded());
    }

    #[tokio::test]
    async fn store_failure_fails_report() {
        let store = Arc::new(MemoryStore::new());
        store.fail_schedule_scans(true).await;
        let engine = engine(MockLogService::new(), store);
        let err = engine.build_report(hour(), None).await.unwrap_err();
        assert!(matches!(err, AdsynkError::Storage { .. }));
    }

    #[tokio::test]
    async fn failure_messages_are_redacted() {
        let log = MockLogService::new().with_submit_failure("fillRate", "bad token tok-abcdef123");
        let engine = engine(log, Arc::new(MemoryStore::new()))
            .with_secrets(vec!["tok-abcdef123".to_string()]);
        let report = engine.build_report(hour(), None).await.unwrap();
        let error = report.outcomes.fill_rate.error.unwrap();
        assert!(!error.message.contains("tok-abcdef123"));
    }

    #[tokio::test]
    async fn realtime_defaults_to_one_hour() {
        let engine = engine(MockLogService::new(), Arc::new(MemoryStore::new()));
        let now = utc(2026, 3, 1, 12, 0, 0);
        let report = engine.realtime_report(now, None, Some("live")).await.unwrap();
        assert_eq!(report.time_range.hours, 1.0);
        assert_eq!(report.time_range.start_time, utc(2026, 3, 1, 11, 0, 0));
        assert_eq!(report.log_group_name, "/aws/mediatailor/live");

        let err = engine.realtime_report(now, Some(169), None).await.unwrap_err();
        assert!(matches!(err, AdsynkError::InvalidInput(_)));
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = MetricReport {
            time_range: hour().into(),
            log_group_name: "/aws/mediatailor/default".into(),
            metrics: ReportMetrics::default(),
            outcomes: MetricOutcomes {
                success_rate: MetricOutcome {
                    status: JobOutcome::Empty,
                    attempts: 0,
                    error: None,
                },
                transcode_time: MetricOutcome {
                    status: JobOutcome::Partial,
                    attempts: 30,
                    error: None,
                },
                fill_rate: MetricOutcome {
                    status: JobOutcome::Complete,
                    attempts: 2,
                    error: None,
                },
            },
            generated_at: utc(2026, 3, 1, 1, 0, 0),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["timeRange"]["hours"], 1.0);
        assert_eq!(json["metrics"]["totalFilledAvails"], 0);
        assert_eq!(json["metrics"]["scheduleSuccessRate"], 0.0);
        assert_eq!(json["outcomes"]["transcodeTime"]["status"], "partial");
        assert!(json["outcomes"]["fillRate"].get("error").is_none());
    }
}
