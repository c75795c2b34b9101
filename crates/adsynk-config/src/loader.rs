// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./adsynk.toml` > `~/.config/adsynk/adsynk.toml` >
//! `/etc/adsynk/adsynk.toml`, with `ADSYNK_` environment variable overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AdsynkConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/adsynk/adsynk.toml";
pub(crate) const LOCAL_CONFIG: &str = "adsynk.toml";

/// Top-level sections that env keys are routed into.
const SECTIONS: [&str; 5] = ["service", "storage", "analytics", "channel", "export"];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("adsynk").join("adsynk.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/adsynk/adsynk.toml`
/// 3. `~/.config/adsynk/adsynk.toml`
/// 4. `./adsynk.toml`
/// 5. `ADSYNK_*` environment variables
pub fn load_config() -> Result<AdsynkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AdsynkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AdsynkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AdsynkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AdsynkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AdsynkConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Map a prefix-stripped env key onto its dotted, lowercase config path.
///
/// Only the leading section name is split off, so `ANALYTICS_API_TOKEN`
/// becomes `analytics.api_token` and never `analytics.api.token`.
pub fn env_key_to_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

fn env_provider() -> Env {
    Env::prefixed("ADSYNK_").map(|key| env_key_to_path(key.as_str()).into())
}
