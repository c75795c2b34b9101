// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide handles, built once per invocation and shared by `Arc`.

use std::sync::Arc;

use tracing::warn;

use adsynk_analytics::{
    AnalyticsSettings, ExportService, HttpLogQueryClient, LogAnalyzer, QueryPoller,
    ReconciliationEngine,
};
use adsynk_channel::{HttpChannelClient, SpliceScheduler};
use adsynk_config::AdsynkConfig;
use adsynk_core::{AdStore, AdsynkError, ChannelScheduler, LogQueryService, PluginAdapter, TokioSleeper};
use adsynk_inventory::InventoryService;
use adsynk_storage::SqliteStore;

/// The store plus whatever remote clients the configuration enables.
pub struct AppContext {
    config: AdsynkConfig,
    store: Arc<SqliteStore>,
    log: Option<Arc<dyn LogQueryService>>,
    channel: Option<Arc<dyn ChannelScheduler>>,
}

impl AppContext {
    /// Open the store and build the HTTP clients that have an endpoint.
    pub async fn open(config: AdsynkConfig) -> Result<Self, AdsynkError> {
        let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
        let log = match config.analytics.endpoint {
            Some(_) => Some(Arc::new(HttpLogQueryClient::from_config(&config.analytics)?)
                as Arc<dyn LogQueryService>),
            None => None,
        };
        let channel = match config.channel.endpoint {
            Some(_) => Some(Arc::new(HttpChannelClient::from_config(&config.channel)?)
                as Arc<dyn ChannelScheduler>),
            None => None,
        };
        Ok(Self {
            config,
            store,
            log,
            channel,
        })
    }

    /// Replace the remote clients, e.g. with in-memory doubles.
    #[cfg(test)]
    pub fn with_clients(
        mut self,
        log: Option<Arc<dyn LogQueryService>>,
        channel: Option<Arc<dyn ChannelScheduler>>,
    ) -> Self {
        self.log = log;
        self.channel = channel;
        self
    }

    pub fn store(&self) -> Arc<dyn AdStore> {
        self.store.clone()
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.store())
    }

    pub fn exporter(&self) -> ExportService {
        ExportService::new(self.store(), self.config.export.default_lookback_days)
    }

    fn settings(&self) -> AnalyticsSettings {
        AnalyticsSettings::from_config(&self.config.analytics)
    }

    fn poller(&self) -> Result<QueryPoller, AdsynkError> {
        let log = self.log.clone().ok_or_else(|| {
            AdsynkError::Config("analytics.endpoint is not set; log commands are disabled".into())
        })?;
        Ok(QueryPoller::new(log, Arc::new(TokioSleeper)))
    }

    pub fn engine(&self) -> Result<ReconciliationEngine, AdsynkError> {
        Ok(
            ReconciliationEngine::new(self.poller()?, self.store(), self.settings())
                .with_secrets(self.config.secrets()),
        )
    }

    pub fn analyzer(&self) -> Result<LogAnalyzer, AdsynkError> {
        Ok(LogAnalyzer::new(self.poller()?, self.settings()))
    }

    pub fn splicer(&self) -> Result<SpliceScheduler, AdsynkError> {
        let channel = self.channel.clone().ok_or_else(|| {
            AdsynkError::Config("channel.endpoint is not set; channel commands are disabled".into())
        })?;
        Ok(SpliceScheduler::new(channel, self.config.channel.action_prefix.clone()))
    }

    /// Flush the store. Failures are logged, not returned.
    pub async fn close(&self) {
        if let Err(e) = self.store.shutdown().await {
            warn!(error = %e, "store shutdown failed");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::temp_context;
    use super::*;

    #[tokio::test]
    async fn remote_commands_need_endpoints() {
        let (ctx, _dir) = temp_context().await;
        assert!(matches!(ctx.engine().err(), Some(AdsynkError::Config(_))));
        assert!(matches!(ctx.analyzer().err(), Some(AdsynkError::Config(_))));
        assert!(matches!(ctx.splicer().err(), Some(AdsynkError::Config(_))));
        ctx.close().await;
    }

    #[tokio::test]
    async fn endpoints_enable_clients() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AdsynkConfig::default();
        config.storage.database_path = dir.path().join("a.db").to_string_lossy().into_owned();
        config.analytics.endpoint = Some("http://127.0.0.1:9/logs".into());
        config.channel.endpoint = Some("http://127.0.0.1:9/media".into());
        let ctx = AppContext::open(config).await.unwrap();
        assert!(ctx.engine().is_ok());
        assert!(ctx.splicer().is_ok());
    }
}
