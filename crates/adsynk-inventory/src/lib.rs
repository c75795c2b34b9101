// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ad inventory and bookings.
//!
//! [`InventoryService`] owns every mutation of ads and bookings; deletions go
//! through the [`DeletionGuard`] and then the store's conditional delete.

pub mod guard;
pub mod service;

pub use guard::{DeletionGuard, GuardDecision};
pub use service::{InventoryService, NewAd, NewSchedule};
