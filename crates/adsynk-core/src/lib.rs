// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Adsynk ad-insertion reconciliation workspace.
//!
//! This crate provides the error taxonomy, the domain types, and the
//! collaborator traits (store, log query service, channel scheduler) that
//! every other Adsynk crate builds on.

pub mod error;
pub mod redact;
pub mod traits;
pub mod types;

pub use error::{AdsynkError, BoxError, ErrorKind};
pub use types::{AdapterType, HealthStatus};

pub use traits::{
    AdStore, ChannelScheduler, LogQueryService, PluginAdapter, Sleeper, TokioSleeper,
};
