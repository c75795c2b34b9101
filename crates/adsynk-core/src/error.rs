// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every Adsynk crate.
//!
//! Expected absences (a log group that is not provisioned yet, a window with
//! no bookings) are normalized into zero-valued results by the components
//! themselves. Only the cases below ever reach a caller as an `Err`.

use strum::{Display, EnumString};
use thiserror::Error;

use crate::redact::redact;

/// Boxed error source carried by wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Adsynk components and adapters.
#[derive(Debug, Error)]
pub enum AdsynkError {
    /// A referenced ad, schedule, or channel does not exist.
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },

    /// Deletion blocked by active bookings, or a remote name collision.
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        /// Number of conflicting records, when the conflict is countable.
        active_count: Option<usize>,
    },

    /// Malformed time range, missing booking fields, or malformed payload.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A remote job did not reach a terminal state within its poll budget.
    #[error("{service} did not finish within {attempts} poll attempts")]
    UpstreamTimeout { service: &'static str, attempts: u32 },

    /// A remote resource (log group, channel) is not provisioned yet.
    #[error("{service} resource unavailable: {resource}")]
    UpstreamUnavailable {
        service: &'static str,
        resource: String,
    },

    /// Any other remote error. Never retried internally.
    #[error("{service} error: {message}")]
    UpstreamFailure {
        service: &'static str,
        message: String,
        source: Option<BoxError>,
    },

    /// Local persistence failure.
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// Invalid or unloadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AdsynkError`], stable for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    UpstreamTimeout,
    UpstreamUnavailable,
    UpstreamFailure,
    Storage,
    Config,
    Internal,
}

impl AdsynkError {
    /// Shorthand for a [`AdsynkError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a [`AdsynkError::UpstreamFailure`] without a source.
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            service,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UpstreamTimeout { .. } => ErrorKind::UpstreamTimeout,
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to the boundary layer.
    ///
    /// Known credential formats and every value in `secrets` are masked.
    pub fn boundary_message(&self, secrets: &[String]) -> String {
        redact(&self.to_string(), secrets)
    }
}
