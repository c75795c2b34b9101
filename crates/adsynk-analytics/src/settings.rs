// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log group naming and poll budgets, derived from `[analytics]`.

use adsynk_config::model::AnalyticsConfig;
use adsynk_core::AdsynkError;
use adsynk_core::types::is_valid_namespace;

use crate::poller::PollPolicy;

/// Maps a configuration name onto its log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupNaming {
    pub prefix: String,
    pub default_name: String,
}

impl Default for LogGroupNaming {
    fn default() -> Self {
        Self {
            prefix: "/aws/mediatailor".to_string(),
            default_name: "default".to_string(),
        }
    }
}

impl LogGroupNaming {
    /// `<prefix>/<name>`; an absent or blank name resolves to the default.
    ///
    /// Names outside `[A-Za-z0-9._-]` are rejected so a caller can never
    /// widen the query to another group.
    pub fn resolve(&self, config_name: Option<&str>) -> Result<String, AdsynkError> {
        let name = match config_name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.default_name.as_str(),
        };
        if !is_valid_namespace(name) {
            return Err(AdsynkError::InvalidInput(format!(
                "invalid configuration name `{name}`: only letters, digits, '.', '_' and '-' are allowed"
            )));
        }
        Ok(format!("{}/{}", self.prefix.trim_end_matches('/'), name))
    }
}

/// Everything the analytics components take from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsSettings {
    pub naming: LogGroupNaming,
    pub routine: PollPolicy,
    pub ad_hoc: PollPolicy,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            naming: LogGroupNaming::default(),
            routine: PollPolicy::routine(),
            ad_hoc: PollPolicy::ad_hoc(),
        }
    }
}

impl AnalyticsSettings {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        let (routine, ad_hoc) = PollPolicy::from_config(config);
        Self {
            naming: LogGroupNaming {
                prefix: config.log_group_prefix.clone(),
                default_name: config.default_config_name.clone(),
            },
            routine,
            ad_hoc,
        }
    }
}
