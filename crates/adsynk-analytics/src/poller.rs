// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submit-and-wait driver for remote log queries.
//!
//! The poller checks first and sleeps only between non-terminal checks. When
//! the attempt budget runs out it hands back whatever it saw last and marks
//! the job as exhausted; the remote job is never cancelled.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use adsynk_config::model::AnalyticsConfig;
use adsynk_core::types::{QueryJob, QueryRequest, TimeWindow};
use adsynk_core::{AdsynkError, LogQueryService, Sleeper};

/// How many times to check a job, and how long to wait between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    /// Budget for the built-in metric queries: 30 checks, 1 s apart.
    pub fn routine() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(1),
        }
    }

    /// Budget for caller-supplied queries: 60 checks, 1 s apart.
    pub fn ad_hoc() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(1),
        }
    }

    /// Routine and ad-hoc budgets from configuration.
    pub fn from_config(config: &AnalyticsConfig) -> (Self, Self) {
        let interval = Duration::from_millis(config.poll_interval_ms);
        (
            Self {
                max_attempts: config.routine_max_attempts,
                interval,
            },
            Self {
                max_attempts: config.ad_hoc_max_attempts,
                interval,
            },
        )
    }

    /// A budget of zero still checks the job once.
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Drives a [`LogQueryService`] job from submission to a terminal status.
#[derive(Clone)]
pub struct QueryPoller {
    service: Arc<dyn LogQueryService>,
    sleeper: Arc<dyn Sleeper>,
}

impl QueryPoller {
    pub fn new(service: Arc<dyn LogQueryService>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { service, sleeper }
    }

    /// Start a query over `window`.
    ///
    /// A log group that does not exist yet yields an empty, already complete
    /// job rather than an error.
    pub async fn submit(
        &self,
        log_group: &str,
        query: &str,
        window: TimeWindow,
    ) -> Result<QueryJob, AdsynkError> {
        if window.start >= window.end {
            return Err(AdsynkError::InvalidInput(format!(
                "query window start {} must precede end {}",
                window.start, window.end
            )));
        }

        let request = QueryRequest {
            log_group: log_group.to_string(),
            query: query.to_string(),
            window,
        };
        match self.service.submit_query(&request).await {
            Ok(id) => {
                debug!(query_id = %id, log_group, "log query submitted");
                Ok(QueryJob::submitted(id, log_group.to_string()))
            }
            Err(AdsynkError::UpstreamUnavailable { resource, .. }) => {
                warn!(log_group, resource = %resource, "log group not found, treating as empty");
                Ok(QueryJob::empty_source(log_group.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Poll `job` until it reaches a terminal status or the budget runs out.
    pub async fn await_completion(
        &self,
        mut job: QueryJob,
        policy: PollPolicy,
    ) -> Result<QueryJob, AdsynkError> {
        let Some(id) = job.id.clone() else {
            return Ok(job);
        };

        let attempts = policy.attempts();
        for attempt in 1..=attempts {
            let snapshot = self.service.poll_status(&id).await?;
            job.status = snapshot.status;
            job.rows = snapshot.rows;
            job.attempts = attempt;
            debug!(
                query_id = %id,
                attempt,
                status = %job.status,
                rows = job.rows.len(),
                "log query status"
            );

            if job.status.is_terminal() {
                return Ok(job);
            }
            if attempt < attempts {
                self.sleeper.sleep(policy.interval).await;
            }
        }

        warn!(
            query_id = %id,
            attempts,
            status = %job.status,
            rows = job.rows.len(),
            "log query still running after poll budget, using partial results"
        );
        job.budget_exhausted = true;
        Ok(job)
    }

    /// Submit and wait in one step.
    pub async fn run(
        &self,
        log_group: &str,
        query: &str,
        window: TimeWindow,
        policy: PollPolicy,
    ) -> Result<QueryJob, AdsynkError> {
        let job = self.submit(log_group, query, window).await?;
        self.await_completion(job, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::{JobOutcome, QueryStatus};
    use adsynk_test_utils::fixtures::utc;
    use adsynk_test_utils::mock_log::{row, snapshot};
    use adsynk_test_utils::{MockLogService, RecordingSleeper};

    const GROUP: &str = "/aws/mediatailor/default";

    fn window() -> TimeWindow {
        TimeWindow::new(utc(2026, 3, 1, 0, 0, 0), utc(2026, 3, 1, 1, 0, 0)).unwrap()
    }

    fn poller(service: MockLogService) -> (QueryPoller, Arc<MockLogService>, RecordingSleeper) {
        let service = Arc::new(service);
        let sleeper = RecordingSleeper::new();
        let poller = QueryPoller::new(service.clone(), Arc::new(sleeper.clone()));
        (poller, service, sleeper)
    }

    #[tokio::test]
    async fn completes_on_fifth_check_after_four_sleeps() {
        let mut script = vec![snapshot(QueryStatus::Running, vec![]); 4];
        script.push(snapshot(
            QueryStatus::Complete,
            vec![row(&[("eventType", "FILLED_AVAIL"), ("count()", "3")])],
        ));
        let (poller, service, sleeper) = poller(MockLogService::new().with_script("stats", script));

        let job = poller
            .run(GROUP, "stats count()", window(), PollPolicy::routine())
            .await
            .unwrap();

        assert_eq!(job.status, QueryStatus::Complete);
        assert_eq!(job.attempts, 5);
        assert_eq!(job.rows.len(), 1);
        assert!(!job.budget_exhausted);
        assert_eq!(sleeper.calls().len(), 4);
        assert_eq!(sleeper.total(), Duration::from_secs(4));
        assert_eq!(service.poll_count("mock-query-1").await, 5);
    }

    #[tokio::test]
    async fn exhausted_budget_keeps_last_status_and_rows() {
        let script = vec![snapshot(
            QueryStatus::Running,
            vec![row(&[("eventType", "FILLED_AVAIL"), ("count()", "1")])],
        )];
        let (poller, _service, sleeper) =
            poller(MockLogService::new().with_script("stats", script));
        let policy = PollPolicy {
            max_attempts: 3,
            interval: Duration::from_secs(1),
        };

        let job = poller.run(GROUP, "stats count()", window(), policy).await.unwrap();

        assert_eq!(job.status, QueryStatus::Running);
        assert!(job.budget_exhausted);
        assert_eq!(job.rows.len(), 1);
        assert_eq!(job.attempts, 3);
        assert_eq!(job.outcome(), JobOutcome::Partial);
        // No sleep after the final check.
        assert_eq!(sleeper.calls().len(), 2);
    }

    #[tokio::test]
    async fn zero_budget_checks_once() {
        let (poller, _service, sleeper) = poller(
            MockLogService::new()
                .with_script("stats", vec![snapshot(QueryStatus::Running, vec![])]),
        );
        let policy = PollPolicy {
            max_attempts: 0,
            interval: Duration::from_secs(1),
        };
        let job = poller.run(GROUP, "stats", window(), policy).await.unwrap();
        assert_eq!(job.attempts, 1);
        assert!(job.budget_exhausted);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_status_is_terminal() {
        let (poller, _service, _sleeper) = poller(MockLogService::new().with_script(
            "stats",
            vec![
                snapshot(QueryStatus::Running, vec![]),
                snapshot(QueryStatus::Failed, vec![]),
            ],
        ));
        let job = poller
            .run(GROUP, "stats", window(), PollPolicy::routine())
            .await
            .unwrap();
        assert_eq!(job.status, QueryStatus::Failed);
        assert_eq!(job.outcome(), JobOutcome::Failed);
        assert!(!job.budget_exhausted);
    }

    #[tokio::test]
    async fn missing_group_is_empty_not_error() {
        let (poller, _service, sleeper) =
            poller(MockLogService::new().with_missing_group(GROUP));
        let job = poller
            .run(GROUP, "stats", window(), PollPolicy::routine())
            .await
            .unwrap();
        assert!(job.id.is_none());
        assert!(job.rows.is_empty());
        assert_eq!(job.outcome(), JobOutcome::Empty);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn other_upstream_errors_propagate() {
        let (poller, _service, _sleeper) = poller(
            MockLogService::new()
                .with_submit_failure("boom", "throttled")
                .with_poll_failure("later", "access denied"),
        );
        let err = poller
            .run(GROUP, "boom", window(), PollPolicy::routine())
            .await
            .unwrap_err();
        assert!(matches!(err, AdsynkError::UpstreamFailure { .. }));

        let err = poller
            .run(GROUP, "later", window(), PollPolicy::routine())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("access denied"));
    }

    #[tokio::test]
    async fn inverted_window_is_rejected_before_submission() {
        let (poller, service, _sleeper) = poller(MockLogService::new());
        let window = TimeWindow {
            start: utc(2026, 3, 1, 2, 0, 0),
            end: utc(2026, 3, 1, 1, 0, 0),
        };
        let err = poller.submit(GROUP, "stats", window).await.unwrap_err();
        assert!(matches!(err, AdsynkError::InvalidInput(_)));
        assert!(service.submitted().await.is_empty());
    }

    #[test]
    fn policies_from_config() {
        let config = AnalyticsConfig {
            poll_interval_ms: 250,
            routine_max_attempts: 5,
            ad_hoc_max_attempts: 9,
            ..AnalyticsConfig::default()
        };
        let (routine, ad_hoc) = PollPolicy::from_config(&config);
        assert_eq!(routine.max_attempts, 5);
        assert_eq!(ad_hoc.max_attempts, 9);
        assert_eq!(routine.interval, Duration::from_millis(250));
        assert_eq!(PollPolicy::routine().max_attempts, 30);
        assert_eq!(PollPolicy::ad_hoc().max_attempts, 60);
    }
}
