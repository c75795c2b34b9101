// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adsynk - scheduled ad insertion reconciliation for live channels.
//!
//! This is the binary entry point. JSON and CSV go to stdout; logs and
//! errors go to stderr.

mod channel;
mod context;
mod export;
mod inventory;
mod output;
mod report;

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use clap::{Parser, Subcommand};

use adsynk_config::AdsynkConfig;
use adsynk_core::AdsynkError;
use adsynk_core::redact::RedactingWriter;

use crate::channel::ChannelCommand;
use crate::context::AppContext;
use crate::inventory::{AdsCommand, EventsCommand, SchedulesCommand};

/// Adsynk - reconcile booked ad insertions against what the logs saw.
#[derive(Parser, Debug)]
#[command(name = "adsynk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a reconciliation report for a recent or explicit window.
    Report {
        /// Hours leading up to now (1..=168). Ignored when --start/--end are given.
        #[arg(long)]
        hours: Option<u32>,
        /// Configuration name whose log group is queried.
        #[arg(long)]
        config_name: Option<String>,
        /// Window start (ISO-8601).
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Window end (ISO-8601).
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// List the most recent avail events of a log group.
    Analyze {
        /// Hours leading up to now (default 24).
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long)]
        config_name: Option<String>,
    },
    /// Run an ad-hoc log query.
    Query {
        #[arg(long)]
        log_group: String,
        #[arg(long)]
        query: String,
        /// Hours leading up to now (default 1).
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Export per-ad performance as CSV.
    Export {
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        start: Option<String>,
        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        end: Option<String>,
        /// Write to this file (or directory) instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage ads.
    #[command(subcommand)]
    Ads(AdsCommand),
    /// Manage bookings.
    #[command(subcommand)]
    Schedules(SchedulesCommand),
    /// Record performance events.
    #[command(subcommand)]
    Events(EventsCommand),
    /// Schedule splice inserts on a live channel.
    #[command(subcommand)]
    Channel(ChannelCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => adsynk_config::load_and_validate_path(path),
        None => adsynk_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            adsynk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let secrets = config.secrets();
    init_tracing(&config.service.log_level, &secrets);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error[{}]: {}", e.kind(), e.boundary_message(&secrets));
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: AdsynkConfig) -> Result<(), AdsynkError> {
    let ctx = AppContext::open(config).await?;
    let mut stdout = std::io::stdout();
    let result = match command {
        Commands::Report {
            hours,
            config_name,
            start,
            end,
        } => {
            report::run_report(
                &ctx,
                &mut stdout,
                hours,
                config_name.as_deref(),
                start.as_deref().zip(end.as_deref()),
            )
            .await
        }
        Commands::Analyze { hours, config_name } => {
            report::run_analyze(&ctx, &mut stdout, hours, config_name.as_deref()).await
        }
        Commands::Query {
            log_group,
            query,
            hours,
        } => report::run_query(&ctx, &mut stdout, &log_group, &query, hours).await,
        Commands::Export { start, end, output } => {
            export::run_export(
                &ctx,
                &mut stdout,
                start.as_deref(),
                end.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Commands::Ads(cmd) => inventory::run_ads(&ctx, &mut stdout, cmd).await,
        Commands::Schedules(cmd) => inventory::run_schedules(&ctx, &mut stdout, cmd).await,
        Commands::Events(cmd) => inventory::run_events(&ctx, &mut stdout, cmd).await,
        Commands::Channel(cmd) => channel::run_channel(&ctx, &mut stdout, cmd).await,
    };
    ctx.close().await;
    result
}

/// Initializes the tracing subscriber on stderr, masking configured secrets.
fn init_tracing(log_level: &str, secrets: &[String]) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("adsynk={log_level},warn")));

    let shared = Arc::new(RwLock::new(Vec::new()));
    for secret in secrets {
        RedactingWriter::<std::io::Stderr>::add_secret(&shared, secret.clone());
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_ansi(false)
        .with_writer(move || RedactingWriter::new(std::io::stderr(), shared.clone()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_window_flags_go_together() {
        assert!(Cli::try_parse_from(["adsynk", "report", "--start", "2026-03-01T00:00:00Z"]).is_err());
        let cli = Cli::try_parse_from([
            "adsynk",
            "report",
            "--start",
            "2026-03-01T00:00:00Z",
            "--end",
            "2026-03-01T01:00:00Z",
            "--config-name",
            "live",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Report { config_name: Some(ref name), .. } if name == "live"
        ));
    }

    #[test]
    fn query_requires_both_fields() {
        assert!(Cli::try_parse_from(["adsynk", "query", "--log-group", "/g"]).is_err());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["adsynk", "ads", "list", "--config", "/tmp/adsynk.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/adsynk.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = adsynk_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.analytics.log_group_prefix, "/aws/mediatailor");
    }
}
