// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adsynk configuration.
//!
//! Settings come from `adsynk.toml` files (system, user, working directory)
//! with `ADSYNK_` environment overrides on top. Unknown keys are rejected and
//! reported with a suggestion; semantic checks run after deserialization.
//!
//! ```no_run
//! let config = adsynk_config::load_and_validate().expect("valid configuration");
//! println!("{}", config.analytics.log_group_prefix);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, TomlSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::AdsynkConfig;

/// Load from the standard locations and validate.
pub fn load_and_validate() -> Result<AdsynkConfig, Vec<ConfigError>> {
    checked(loader::load_config(), standard_sources)
}

/// Load `path` (plus environment overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<AdsynkConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        TomlSource::read(path).into_iter().collect()
    })
}

/// Load a TOML string and validate. Used by tests and tooling.
pub fn load_and_validate_str(toml_content: &str) -> Result<AdsynkConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![TomlSource::new("<inline>", toml_content)]
    })
}

/// Validate a loaded config, or translate the load failure. Sources are only
/// read when there is an error to point into.
fn checked(
    loaded: Result<AdsynkConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<TomlSource>,
) -> Result<AdsynkConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn standard_sources() -> Vec<TomlSource> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG.into());
    [
        Some(local),
        loader::user_config_path(),
        Some(loader::SYSTEM_CONFIG.into()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| TomlSource::read(&path))
    .collect()
}
