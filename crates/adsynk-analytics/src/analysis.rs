// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detailed event listing and caller-supplied log queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use adsynk_core::AdsynkError;
use adsynk_core::types::{JobOutcome, QueryStatus, ResultRow, TimeWindow};

use crate::extractor::project_row;
use crate::poller::QueryPoller;
use crate::queries::{DETAILED_EVENTS_QUERY, DETAILED_EVENT_FIELDS};
use crate::reconcile::TimeRange;
use crate::settings::AnalyticsSettings;

const DEFAULT_ANALYSIS_HOURS: u32 = 24;
const DEFAULT_QUERY_HOURS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_events: usize,
    pub log_group_name: String,
}

/// The most recent avail events of one log group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAnalysis {
    pub time_range: TimeRange,
    pub events: Vec<BTreeMap<String, String>>,
    pub summary: AnalysisSummary,
    pub outcome: JobOutcome,
}

/// Result of an ad-hoc query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdHocResult {
    /// Absent when the log group does not exist.
    pub query_id: Option<String>,
    /// Last status reported by the service.
    pub status: QueryStatus,
    pub budget_exhausted: bool,
    pub outcome: JobOutcome,
    pub results: Vec<ResultRow>,
}

/// Runs single log queries outside the reconciliation report.
#[derive(Clone)]
pub struct LogAnalyzer {
    poller: QueryPoller,
    settings: AnalyticsSettings,
}

impl LogAnalyzer {
    pub fn new(poller: QueryPoller, settings: AnalyticsSettings) -> Self {
        Self { poller, settings }
    }

    /// Up to 100 recent avail events in `[now - hours, now)`; `hours` defaults to 24.
    pub async fn analyze(
        &self,
        now: DateTime<Utc>,
        hours: Option<u32>,
        config_name: Option<&str>,
    ) -> Result<DetailedAnalysis, AdsynkError> {
        let log_group = self.settings.naming.resolve(config_name)?;
        let window = TimeWindow::trailing_hours(now, hours.unwrap_or(DEFAULT_ANALYSIS_HOURS))?;

        let job = self
            .poller
            .run(&log_group, DETAILED_EVENTS_QUERY, window, self.settings.routine)
            .await?;
        let events: Vec<_> = job
            .rows
            .iter()
            .map(|row| project_row(row, &DETAILED_EVENT_FIELDS))
            .collect();

        info!(log_group = %log_group, events = events.len(), "detailed analysis complete");
        Ok(DetailedAnalysis {
            time_range: window.into(),
            summary: AnalysisSummary {
                total_events: events.len(),
                log_group_name: log_group,
            },
            events,
            outcome: job.outcome(),
        })
    }

    /// Run `query` against `log_group` over the last `hours` (default 1).
    pub async fn run_query(
        &self,
        now: DateTime<Utc>,
        log_group: &str,
        query: &str,
        hours: Option<u32>,
    ) -> Result<AdHocResult, AdsynkError> {
        let mut missing = Vec::new();
        if log_group.trim().is_empty() {
            missing.push("logGroupName");
        }
        if query.trim().is_empty() {
            missing.push("queryString");
        }
        if !missing.is_empty() {
            return Err(AdsynkError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        let window = TimeWindow::trailing_hours(now, hours.unwrap_or(DEFAULT_QUERY_HOURS))?;

        let job = self
            .poller
            .run(log_group, query, window, self.settings.ad_hoc)
            .await?;
        info!(
            log_group,
            status = %job.status,
            attempts = job.attempts,
            rows = job.rows.len(),
            "ad-hoc query finished"
        );
        Ok(AdHocResult {
            outcome: job.outcome(),
            query_id: job.id,
            status: job.status,
            budget_exhausted: job.budget_exhausted,
            results: job.rows,
        })
    }
}
