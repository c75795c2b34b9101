// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod log_query;
pub mod sleeper;
pub mod store;

pub use adapter::PluginAdapter;
pub use channel::ChannelScheduler;
pub use log_query::LogQueryService;
pub use sleeper::{Sleeper, TokioSleeper};
pub use store::AdStore;
