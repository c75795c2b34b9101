// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted log query service for deterministic testing.
//!
//! Each submitted query is matched against the configured rules by substring.
//! A matching script is replayed one snapshot per poll, and its last snapshot
//! repeats forever. Unmatched queries complete at once with no rows.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use adsynk_core::types::{
    AdapterType, HealthStatus, PollSnapshot, QueryRequest, QueryStatus, ResultField, ResultRow,
};
use adsynk_core::{AdsynkError, LogQueryService, PluginAdapter};

const SERVICE: &str = "log-query";

enum Behavior {
    Script(Vec<PollSnapshot>),
    FailSubmit(String),
    FailPoll(String),
}

struct Rule {
    matcher: String,
    behavior: Behavior,
}

struct Job {
    script: VecDeque<PollSnapshot>,
    fail_poll: Option<String>,
    polls: u32,
}

#[derive(Default)]
struct State {
    rules: Vec<Rule>,
    missing_groups: HashSet<String>,
    jobs: HashMap<String, Job>,
    submitted: Vec<QueryRequest>,
    next_id: u64,
}

/// A log query service that replays scripted statuses.
#[derive(Default)]
pub struct MockLogService {
    state: Mutex<State>,
}

impl MockLogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries containing `matcher` replay `snapshots`, one per poll.
    pub fn with_script(mut self, matcher: &str, snapshots: Vec<PollSnapshot>) -> Self {
        self.push_rule(matcher, Behavior::Script(snapshots));
        self
    }

    /// Queries containing `matcher` fail at submission.
    pub fn with_submit_failure(mut self, matcher: &str, message: &str) -> Self {
        self.push_rule(matcher, Behavior::FailSubmit(message.to_string()));
        self
    }

    /// Queries containing `matcher` are accepted but every poll fails.
    pub fn with_poll_failure(mut self, matcher: &str, message: &str) -> Self {
        self.push_rule(matcher, Behavior::FailPoll(message.to_string()));
        self
    }

    /// Submissions against `log_group` report the group as missing.
    pub fn with_missing_group(mut self, log_group: &str) -> Self {
        self.state.get_mut().missing_groups.insert(log_group.to_string());
        self
    }

    fn push_rule(&mut self, matcher: &str, behavior: Behavior) {
        self.state.get_mut().rules.push(Rule {
            matcher: matcher.to_string(),
            behavior,
        });
    }

    /// Every request submitted so far, in order.
    pub async fn submitted(&self) -> Vec<QueryRequest> {
        self.state.lock().await.submitted.clone()
    }

    /// How many times `query_id` has been polled.
    pub async fn poll_count(&self, query_id: &str) -> u32 {
        self.state
            .lock()
            .await
            .jobs
            .get(query_id)
            .map(|j| j.polls)
            .unwrap_or(0)
    }
}

/// A status snapshot with rows.
pub fn snapshot(status: QueryStatus, rows: Vec<ResultRow>) -> PollSnapshot {
    PollSnapshot { status, rows }
}

/// A result row from `(field, value)` pairs.
pub fn row(pairs: &[(&str, &str)]) -> ResultRow {
    pairs
        .iter()
        .map(|(field, value)| ResultField::new(*field, *value))
        .collect()
}

#[async_trait]
impl PluginAdapter for MockLogService {
    fn name(&self) -> &str {
        "mock-log-query"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LogQuery
    }

    async fn health_check(&self) -> Result<HealthStatus, AdsynkError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LogQueryService for MockLogService {
    async fn submit_query(&self, request: &QueryRequest) -> Result<String, AdsynkError> {
        let mut state = self.state.lock().await;
        state.submitted.push(request.clone());

        if state.missing_groups.contains(&request.log_group) {
            return Err(AdsynkError::UpstreamUnavailable {
                service: SERVICE,
                resource: request.log_group.clone(),
            });
        }

        let mut job = Job {
            script: VecDeque::new(),
            fail_poll: None,
            polls: 0,
        };
        if let Some(rule) = state
            .rules
            .iter()
            .find(|r| request.query.contains(&r.matcher))
        {
            match &rule.behavior {
                Behavior::Script(snapshots) => job.script = snapshots.iter().cloned().collect(),
                Behavior::FailSubmit(message) => {
                    return Err(AdsynkError::upstream(SERVICE, message.clone()));
                }
                Behavior::FailPoll(message) => job.fail_poll = Some(message.clone()),
            }
        }

        state.next_id += 1;
        let id = format!("mock-query-{}", state.next_id);
        state.jobs.insert(id.clone(), job);
        Ok(id)
    }

    async fn poll_status(&self, query_id: &str) -> Result<PollSnapshot, AdsynkError> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(query_id)
            .ok_or_else(|| AdsynkError::not_found("query", query_id))?;
        job.polls += 1;

        if let Some(message) = &job.fail_poll {
            return Err(AdsynkError::upstream(SERVICE, message.clone()));
        }
        let snapshot = if job.script.len() > 1 {
            job.script.pop_front()
        } else {
            job.script.front().cloned()
        };
        Ok(snapshot.unwrap_or_else(|| self::snapshot(QueryStatus::Complete, Vec::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsynk_core::types::TimeWindow;
    use chrono::{TimeZone, Utc};

    fn request(group: &str, query: &str) -> QueryRequest {
        QueryRequest {
            log_group: group.to_string(),
            query: query.to_string(),
            window: TimeWindow::new(
                Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 3, 1, 1, 0, 0).unwrap(),
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn script_replays_then_sticks_on_last() {
        let service = MockLogService::new().with_script(
            "count",
            vec![
                snapshot(QueryStatus::Running, vec![]),
                snapshot(QueryStatus::Complete, vec![row(&[("n", "1")])]),
            ],
        );
        let id = service.submit_query(&request("/g", "stats count(*)")).await.unwrap();
        assert_eq!(service.poll_status(&id).await.unwrap().status, QueryStatus::Running);
        assert_eq!(service.poll_status(&id).await.unwrap().status, QueryStatus::Complete);
        let again = service.poll_status(&id).await.unwrap();
        assert_eq!(again.status, QueryStatus::Complete);
        assert_eq!(again.rows.len(), 1);
        assert_eq!(service.poll_count(&id).await, 3);
    }

    #[tokio::test]
    async fn missing_group_and_failures() {
        let service = MockLogService::new()
            .with_missing_group("/absent")
            .with_submit_failure("boom", "throttled")
            .with_poll_failure("later", "access denied");

        let err = service.submit_query(&request("/absent", "x")).await.unwrap_err();
        assert!(matches!(err, AdsynkError::UpstreamUnavailable { .. }));

        let err = service.submit_query(&request("/g", "boom")).await.unwrap_err();
        assert!(matches!(err, AdsynkError::UpstreamFailure { .. }));

        let id = service.submit_query(&request("/g", "later")).await.unwrap();
        assert!(service.poll_status(&id).await.is_err());
        assert_eq!(service.submitted().await.len(), 3);
    }

    #[tokio::test]
    async fn unmatched_query_completes_empty() {
        let service = MockLogService::new();
        let id = service.submit_query(&request("/g", "anything")).await.unwrap();
        let snap = service.poll_status(&id).await.unwrap();
        assert_eq!(snap.status, QueryStatus::Complete);
        assert!(snap.rows.is_empty());
    }
}
