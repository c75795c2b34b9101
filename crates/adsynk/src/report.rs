// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `adsynk report`, `adsynk analyze` and `adsynk query`.

use std::io::Write;

use chrono::Utc;
use tracing::warn;

use adsynk_core::AdsynkError;
use adsynk_core::types::{TimeWindow, parse_iso_utc};

use crate::context::AppContext;
use crate::output::print_json;

/// Print a reconciliation report.
///
/// An explicit `(start, end)` window wins over `hours`.
pub async fn run_report(
    ctx: &AppContext,
    out: &mut dyn Write,
    hours: Option<u32>,
    config_name: Option<&str>,
    window: Option<(&str, &str)>,
) -> Result<(), AdsynkError> {
    let engine = ctx.engine()?;
    let report = match window {
        Some((start, end)) => {
            let window = TimeWindow::new(parse_instant("start", start)?, parse_instant("end", end)?)?;
            engine.build_report(window, config_name).await?
        }
        None => engine.realtime_report(Utc::now(), hours, config_name).await?,
    };
    if report.outcomes.is_degraded() {
        warn!(log_group = %report.log_group_name, "report contains degraded metrics");
    }
    print_json(out, &report)
}

pub async fn run_analyze(
    ctx: &AppContext,
    out: &mut dyn Write,
    hours: Option<u32>,
    config_name: Option<&str>,
) -> Result<(), AdsynkError> {
    let analysis = ctx.analyzer()?.analyze(Utc::now(), hours, config_name).await?;
    print_json(out, &analysis)
}

pub async fn run_query(
    ctx: &AppContext,
    out: &mut dyn Write,
    log_group: &str,
    query: &str,
    hours: Option<u32>,
) -> Result<(), AdsynkError> {
    let result = ctx
        .analyzer()?
        .run_query(Utc::now(), log_group, query, hours)
        .await?;
    print_json(out, &result)
}

fn parse_instant(field: &str, raw: &str) -> Result<chrono::DateTime<Utc>, AdsynkError> {
    parse_iso_utc(raw).ok_or_else(|| {
        AdsynkError::InvalidInput(format!("{field} `{raw}` is not an ISO-8601 timestamp"))
    })
}
