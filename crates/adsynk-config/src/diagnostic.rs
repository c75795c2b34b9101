// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment failures into miette diagnostics pointing into the TOML.

#![allow(unused_assignments)] // emitted by the miette Diagnostic derive

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Keys scoring below this Jaro-Winkler similarity get no suggestion.
const MIN_SIMILARITY: f64 = 0.75;

/// A TOML document that fed the configuration, kept for span lookup.
#[derive(Debug, Clone)]
pub struct TomlSource {
    /// File path, or `<inline>` for string input.
    pub name: String,
    pub content: String,
}

impl TomlSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read `path`, or `None` when it does not exist or cannot be read.
    pub fn read(path: &std::path::Path) -> Option<Self> {
        std::fs::read_to_string(path)
            .ok()
            .map(|content| Self::new(path.display().to_string(), content))
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(adsynk::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Keys accepted in the same table, comma-separated.
        valid_keys: String,
        #[label("not an adsynk setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(adsynk::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `analytics.poll_interval_ms`.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(adsynk::config::missing_key),
        help("set `{key}` in adsynk.toml or through an ADSYNK_ environment variable")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(adsynk::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(adsynk::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let Some(suggestion) = suggestion else {
        return format!("valid keys: {valid_keys}");
    };
    format!("did you mean `{suggestion}`? Valid keys: {valid_keys}")
}

/// Split a figment error into one [`ConfigError`] per underlying failure.
pub fn figment_to_config_errors(err: figment::Error, sources: &[TomlSource]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate(&error, field, sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &expected[..]),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => {
                let key = dotted(&error.path);
                let leaf = error.path.last().cloned().unwrap_or_default();
                let (span, src) = locate(&error, &leaf, sources);
                ConfigError::InvalidType {
                    key,
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.clone(),
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn dotted(path: &[String]) -> String {
    path.join(".")
}

/// Find the document an error came from and the key's span inside it.
fn locate(
    error: &figment::error::Error,
    key: &str,
    sources: &[TomlSource],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|meta| meta.source.as_ref())
        .and_then(|source| source.file_path())
        .map(|path| path.display().to_string());

    // Inline input has no path, and figment may resolve a relative path, so a
    // lone source is used whenever the name does not match.
    let source = origin
        .and_then(|name| sources.iter().find(|s| s.name == name))
        .or(match sources {
            [only] => Some(only),
            _ => None,
        });
    let Some(source) = source else {
        return (None, None);
    };

    // The table is the path minus the key itself, when the key is last.
    let table = match error.path.split_last() {
        Some((last, parent)) if last == key => parent,
        _ => error.path.as_slice(),
    };
    match find_key_offset(&source.content, table, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(&source.name, source.content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key` as a left-hand side, searched from the `[table]` header on.
pub fn find_key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let start = match table.first() {
        Some(name) => {
            let header = format!("[{name}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut line_start = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        let is_assignment = rest
            .strip_prefix(key)
            .is_some_and(|after| after.trim_start().starts_with('='));
        if is_assignment {
            return Some(line_start + indent);
        }
        line_start += line.len();
    }
    None
}

/// The valid key closest to `unknown`, if it is similar enough.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, valid_keys: &[S]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (key.as_ref(), strsim::jaro_winkler(unknown, key.as_ref())))
        .filter(|(_, score)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Print every error to stderr with source excerpts where available.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
