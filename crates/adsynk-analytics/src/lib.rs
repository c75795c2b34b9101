// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log analytics for Adsynk.
//!
//! Submits log queries and waits for them ([`QueryPoller`]), reads metrics out
//! of their rows ([`extractor`]), reconciles them against the booking store
//! ([`ReconciliationEngine`]), and renders per-ad performance CSVs
//! ([`ExportService`]).

pub mod analysis;
pub mod client;
pub mod extractor;
pub mod performance;
pub mod poller;
pub mod queries;
pub mod reconcile;
pub mod settings;

pub use analysis::{AdHocResult, DetailedAnalysis, LogAnalyzer};
pub use client::HttpLogQueryClient;
pub use extractor::FillStats;
pub use performance::{AdPerformanceRow, CsvExport, ExportService, SuccessRate};
pub use poller::{PollPolicy, QueryPoller};
pub use reconcile::{MetricOutcome, MetricReport, ReconciliationEngine, ReportMetrics};
pub use settings::{AnalyticsSettings, LogGroupNaming};
