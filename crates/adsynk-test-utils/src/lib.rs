// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Adsynk integration tests.
//!
//! Provides scripted and in-memory collaborators so the engine can be driven
//! deterministically without a log service, a channel API, or real delays.
//!
//! # Components
//!
//! - [`MockLogService`] - Scripted log query service with failure injection
//! - [`RecordingSleeper`] - Sleeper that records requested delays and returns at once
//! - [`MemoryStore`] - In-memory store with atomic conditional delete
//! - [`MockChannel`] - In-memory live channel schedule
//! - [`fixtures`] - Record builders and a throwaway SQLite store

pub mod fixtures;
pub mod memory_store;
pub mod mock_channel;
pub mod mock_log;
pub mod sleeper;

pub use memory_store::MemoryStore;
pub use mock_channel::MockChannel;
pub use mock_log::MockLogService;
pub use sleeper::RecordingSleeper;
