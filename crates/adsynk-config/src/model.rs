// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Adsynk configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdsynkConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log query gateway and polling settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Live-channel scheduling API settings.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// CSV export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

impl AdsynkConfig {
    /// Every configured secret value, for log and error redaction.
    pub fn secrets(&self) -> Vec<String> {
        [&self.analytics.api_token, &self.channel.api_token]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("adsynk").join("adsynk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("adsynk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Log query gateway and poll budget configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Base URL of the log query gateway. `None` disables log-backed commands.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent to the gateway.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Log groups are named `<prefix>/<config name>`.
    #[serde(default = "default_log_group_prefix")]
    pub log_group_prefix: String,

    /// Namespace used when a caller gives no config name.
    #[serde(default = "default_config_name")]
    pub default_config_name: String,

    /// Delay between poll attempts, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Poll budget for the built-in metric queries.
    #[serde(default = "default_routine_max_attempts")]
    pub routine_max_attempts: u32,

    /// Poll budget for caller-supplied queries.
    #[serde(default = "default_ad_hoc_max_attempts")]
    pub ad_hoc_max_attempts: u32,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            log_group_prefix: default_log_group_prefix(),
            default_config_name: default_config_name(),
            poll_interval_ms: default_poll_interval_ms(),
            routine_max_attempts: default_routine_max_attempts(),
            ad_hoc_max_attempts: default_ad_hoc_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_log_group_prefix() -> String {
    "/aws/mediatailor".to_string()
}

fn default_config_name() -> String {
    "default".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_routine_max_attempts() -> u32 {
    30
}

fn default_ad_hoc_max_attempts() -> u32 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Live-channel scheduling API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Base URL of the channel API. `None` disables channel commands.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent to the channel API.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Region the channel lives in, forwarded as a request header.
    #[serde(default = "default_region")]
    pub region: String,

    /// Prefix for action names derived from bookings.
    #[serde(default = "default_action_prefix")]
    pub action_prefix: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            region: default_region(),
            action_prefix: default_action_prefix(),
        }
    }
}

fn default_region() -> String {
    "ap-northeast-2".to_string()
}

fn default_action_prefix() -> String {
    "adsynk".to_string()
}

/// CSV export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Window length used when the caller gives no start date.
    #[serde(default = "default_lookback_days")]
    pub default_lookback_days: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: default_lookback_days(),
        }
    }
}

fn default_lookback_days() -> u32 {
    30
}
