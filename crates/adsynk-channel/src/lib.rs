// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SCTE-35 splice insert scheduling on a live channel.

pub mod client;
pub mod splice;

pub use client::HttpChannelClient;
pub use splice::{SpliceRequest, SpliceScheduler};
