// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero poll budgets, URL schemes, and namespace characters.

use adsynk_core::types::is_valid_namespace;

use crate::diagnostic::ConfigError;
use crate::model::AdsynkConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns all collected validation errors, not just the first.
pub fn validate_config(config: &AdsynkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.service.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let analytics = &config.analytics;
    if !analytics.log_group_prefix.starts_with('/') {
        fail(format!(
            "analytics.log_group_prefix `{}` must start with `/`",
            analytics.log_group_prefix
        ));
    }
    if !is_valid_namespace(&analytics.default_config_name) {
        fail(format!(
            "analytics.default_config_name `{}` may only contain letters, digits, `.`, `_` and `-`",
            analytics.default_config_name
        ));
    }
    if analytics.poll_interval_ms == 0 {
        fail("analytics.poll_interval_ms must be greater than 0".to_string());
    }
    if analytics.routine_max_attempts < 1 {
        fail("analytics.routine_max_attempts must be at least 1".to_string());
    }
    if analytics.ad_hoc_max_attempts < 1 {
        fail("analytics.ad_hoc_max_attempts must be at least 1".to_string());
    }
    if analytics.request_timeout_secs == 0 {
        fail("analytics.request_timeout_secs must be greater than 0".to_string());
    }

    for (key, endpoint) in [
        ("analytics.endpoint", &analytics.endpoint),
        ("channel.endpoint", &config.channel.endpoint),
    ] {
        if let Some(url) = endpoint
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            fail(format!("{key} `{url}` must start with http:// or https://"));
        }
    }

    if config.channel.action_prefix.trim().is_empty() {
        fail("channel.action_prefix must not be empty".to_string());
    }

    if config.export.default_lookback_days == 0 {
        fail("export.default_lookback_days must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = AdsynkConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = AdsynkConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn zero_budgets_fail_validation() {
        let mut config = AdsynkConfig::default();
        config.analytics.poll_interval_ms = 0;
        config.analytics.routine_max_attempts = 0;
        config.analytics.ad_hoc_max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "all errors are collected: {errors:?}");
        assert!(has_error(&errors, "poll_interval_ms"));
        assert!(has_error(&errors, "routine_max_attempts"));
        assert!(has_error(&errors, "ad_hoc_max_attempts"));
    }

    #[test]
    fn prefix_must_be_rooted() {
        let mut config = AdsynkConfig::default();
        config.analytics.log_group_prefix = "aws/mediatailor".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "log_group_prefix"));
    }

    #[test]
    fn default_config_name_follows_namespace_rule() {
        let mut config = AdsynkConfig::default();
        config.analytics.default_config_name = "prod/*".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "default_config_name"));
    }

    #[test]
    fn endpoint_scheme_is_checked() {
        let mut config = AdsynkConfig::default();
        config.analytics.endpoint = Some("logs.internal:8080".to_string());
        config.channel.endpoint = Some("https://channels.internal".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "analytics.endpoint"));
        assert!(!has_error(&errors, "channel.endpoint"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = AdsynkConfig::default();
        config.service.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "log_level"));
    }
}
