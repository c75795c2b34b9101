// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the log query gateway.
//!
//! `POST {endpoint}/queries` starts a query and `GET {endpoint}/queries/{id}`
//! reports its status and rows. Errors come back as `{code, message}`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use adsynk_config::model::AnalyticsConfig;
use adsynk_core::types::{
    AdapterType, HealthStatus, PollSnapshot, QueryRequest, QueryStatus, ResultField,
};
use adsynk_core::{AdsynkError, LogQueryService, PluginAdapter};

const SERVICE: &str = "log-query";
const LOG_GROUP_MISSING: &str = "ResourceNotFoundException";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartQueryBody<'a> {
    log_group_name: &'a str,
    query_string: &'a str,
    start_time: i64,
    end_time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartQueryResponse {
    query_id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResultsResponse {
    status: String,
    #[serde(default)]
    results: Vec<Vec<ResultField>>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// [`LogQueryService`] over the HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpLogQueryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpLogQueryClient {
    /// Creates a client for `endpoint`, sending `api_token` as a bearer token if set.
    pub fn new(
        endpoint: &str,
        api_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AdsynkError> {
        let base_url = Url::parse(endpoint).map_err(|e| {
            AdsynkError::Config(format!("invalid analytics endpoint `{endpoint}`: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AdsynkError::Config(format!(
                "analytics endpoint `{endpoint}` cannot be used as a base URL"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = api_token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AdsynkError::Config(format!("invalid analytics api token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AdsynkError::UpstreamFailure {
                service: SERVICE,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, base_url })
    }

    /// `{endpoint}/<segments...>` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, AdsynkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AdsynkError::Internal("analytics endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds the client from `[analytics]`; the endpoint must be configured.
    pub fn from_config(config: &AnalyticsConfig) -> Result<Self, AdsynkError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| AdsynkError::Config("analytics.endpoint is not set".to_string()))?;
        Self::new(
            endpoint,
            config.api_token.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn read_error(response: reqwest::Response) -> (StatusCode, ApiError) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let api_error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| ApiError {
            code: String::new(),
            message: body,
        });
        (status, api_error)
    }
}

fn transport_error(e: reqwest::Error) -> AdsynkError {
    if e.is_timeout() {
        return AdsynkError::UpstreamTimeout {
            service: SERVICE,
            attempts: 1,
        };
    }
    AdsynkError::UpstreamFailure {
        service: SERVICE,
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

fn api_failure(status: StatusCode, error: ApiError) -> AdsynkError {
    let message = if error.code.is_empty() {
        format!("gateway returned {status}: {}", error.message)
    } else {
        format!("gateway returned {status}: {}: {}", error.code, error.message)
    };
    AdsynkError::upstream(SERVICE, message)
}

#[async_trait]
impl PluginAdapter for HttpLogQueryClient {
    fn name(&self) -> &str {
        "http-log-query"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LogQuery
    }

    async fn health_check(&self) -> Result<HealthStatus, AdsynkError> {
        // Any live check would start a billable query; a built client is healthy.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LogQueryService for HttpLogQueryClient {
    async fn submit_query(&self, request: &QueryRequest) -> Result<String, AdsynkError> {
        let body = StartQueryBody {
            log_group_name: &request.log_group,
            query_string: &request.query,
            start_time: request.window.start_epoch(),
            end_time: request.window.end_epoch(),
        };
        let response = self
            .client
            .post(self.url(&["queries"])?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = %status, log_group = %request.log_group, "start query response received");
        if !status.is_success() {
            let (status, error) = Self::read_error(response).await;
            if error.code == LOG_GROUP_MISSING {
                return Err(AdsynkError::UpstreamUnavailable {
                    service: SERVICE,
                    resource: request.log_group.clone(),
                });
            }
            return Err(api_failure(status, error));
        }

        let started: StartQueryResponse = response.json().await.map_err(|e| {
            AdsynkError::UpstreamFailure {
                service: SERVICE,
                message: format!("malformed start query response: {e}"),
                source: Some(Box::new(e)),
            }
        })?;
        Ok(started.query_id)
    }

    async fn poll_status(&self, query_id: &str) -> Result<PollSnapshot, AdsynkError> {
        let response = self
            .client
            .get(self.url(&["queries", query_id])?)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = %status, query_id, "query results response received");
        if !status.is_success() {
            let (status, error) = Self::read_error(response).await;
            return Err(api_failure(status, error));
        }

        let results: QueryResultsResponse = response.json().await.map_err(|e| {
            AdsynkError::UpstreamFailure {
                service: SERVICE,
                message: format!("malformed query results response: {e}"),
                source: Some(Box::new(e)),
            }
        })?;
        Ok(PollSnapshot {
            status: QueryStatus::from_str(&results.status).unwrap_or(QueryStatus::Unknown),
            rows: results.results,
        })
    }
}
