// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External managed-log query service.

use async_trait::async_trait;

use crate::error::AdsynkError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{PollSnapshot, QueryRequest};

/// Submit-then-poll access to a hosted log query engine.
#[async_trait]
pub trait LogQueryService: PluginAdapter {
    /// Start a query over `request.window` and return the remote job id.
    ///
    /// A log group that does not exist yields
    /// [`AdsynkError::UpstreamUnavailable`].
    async fn submit_query(&self, request: &QueryRequest) -> Result<String, AdsynkError>;

    /// Fetch the current status and whatever rows are available.
    async fn poll_status(&self, query_id: &str) -> Result<PollSnapshot, AdsynkError>;
}
