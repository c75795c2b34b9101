// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the live-channel scheduling API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use adsynk_config::model::ChannelConfig;
use adsynk_core::types::{AdapterType, ChannelInfo, HealthStatus, ScheduleAction};
use adsynk_core::{AdsynkError, ChannelScheduler, PluginAdapter};

const SERVICE: &str = "channel";
const REGION_HEADER: HeaderName = HeaderName::from_static("x-channel-region");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DescribeChannelResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
}

/// What a 404 refers to, so the mapped error names the right entity.
#[derive(Clone, Copy)]
enum Subject<'a> {
    Channel(&'a str),
    Action(&'a str),
}

/// [`ChannelScheduler`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChannelClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpChannelClient {
    /// Creates a client for `endpoint`, tagging every request with `region`.
    pub fn new(endpoint: &str, api_token: Option<&str>, region: &str) -> Result<Self, AdsynkError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| AdsynkError::Config(format!("invalid channel endpoint `{endpoint}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AdsynkError::Config(format!(
                "channel endpoint `{endpoint}` cannot be used as a base URL"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            REGION_HEADER,
            HeaderValue::from_str(region)
                .map_err(|e| AdsynkError::Config(format!("invalid channel region: {e}")))?,
        );
        if let Some(token) = api_token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AdsynkError::Config(format!("invalid channel api token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdsynkError::UpstreamFailure {
                service: SERVICE,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, base_url })
    }

    /// Builds the client from `[channel]`; the endpoint must be configured.
    pub fn from_config(config: &ChannelConfig) -> Result<Self, AdsynkError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| AdsynkError::Config("channel.endpoint is not set".to_string()))?;
        Self::new(endpoint, config.api_token.as_deref(), &config.region)
    }

    /// `{endpoint}/<segments...>` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, AdsynkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AdsynkError::Internal("channel endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: reqwest::Response, subject: Subject<'_>) -> Result<reqwest::Response, AdsynkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| ApiError {
            code: String::new(),
            message: body,
        });
        Err(map_api_error(status, error, subject))
    }
}

fn map_api_error(status: StatusCode, error: ApiError, subject: Subject<'_>) -> AdsynkError {
    let code = if error.code.is_empty() {
        match status {
            StatusCode::NOT_FOUND => "NotFoundException",
            StatusCode::CONFLICT => "ConflictException",
            StatusCode::BAD_REQUEST => "BadRequestException",
            _ => "",
        }
    } else {
        error.code.as_str()
    };

    match code {
        "NotFoundException" => match subject {
            Subject::Channel(id) => AdsynkError::not_found("channel", id),
            Subject::Action(name) => AdsynkError::not_found("schedule action", name),
        },
        "ConflictException" => AdsynkError::Conflict {
            message: error.message,
            active_count: None,
        },
        "BadRequestException" => AdsynkError::InvalidInput(error.message),
        "" => AdsynkError::upstream(SERVICE, format!("channel API returned {status}: {}", error.message)),
        other => AdsynkError::upstream(
            SERVICE,
            format!("channel API returned {status}: {other}: {}", error.message),
        ),
    }
}

fn transport_error(e: reqwest::Error) -> AdsynkError {
    AdsynkError::UpstreamFailure {
        service: SERVICE,
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for HttpChannelClient {
    fn name(&self) -> &str {
        "http-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, AdsynkError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelScheduler for HttpChannelClient {
    async fn describe_channel(&self, channel_id: &str) -> Result<ChannelInfo, AdsynkError> {
        let response = self
            .client
            .get(self.url(&["channels", channel_id])?)
            .send()
            .await
            .map_err(transport_error)?;
        debug!(status = %response.status(), channel_id, "describe channel response received");
        let response = Self::check(response, Subject::Channel(channel_id)).await?;

        let body: DescribeChannelResponse =
            response.json().await.map_err(|e| AdsynkError::UpstreamFailure {
                service: SERVICE,
                message: format!("malformed describe channel response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(ChannelInfo {
            channel_id: channel_id.to_string(),
            name: body.name,
            state: body.state,
        })
    }

    async fn create_schedule_action(
        &self,
        channel_id: &str,
        action: &ScheduleAction,
    ) -> Result<(), AdsynkError> {
        let response = self
            .client
            .post(self.url(&["channels", channel_id, "schedule"])?)
            .json(action)
            .send()
            .await
            .map_err(transport_error)?;
        debug!(
            status = %response.status(),
            channel_id,
            action_name = %action.action_name,
            "create schedule action response received"
        );
        Self::check(response, Subject::Channel(channel_id)).await?;
        Ok(())
    }

    async fn delete_schedule_action(
        &self,
        channel_id: &str,
        action_name: &str,
    ) -> Result<(), AdsynkError> {
        let response = self
            .client
            .delete(self.url(&["channels", channel_id, "schedule", action_name])?)
            .send()
            .await
            .map_err(transport_error)?;
        debug!(
            status = %response.status(),
            channel_id,
            action_name,
            "delete schedule action response received"
        );
        Self::check(response, Subject::Action(action_name)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> HttpChannelClient {
        HttpChannelClient::new(base_url, Some("chan-token-123"), "ap-northeast-2").unwrap()
    }

    fn action() -> ScheduleAction {
        ScheduleAction {
            action_name: "adsynk-schedule_1".into(),
            start_time: "2026-03-01T01:00:00.000000Z".into(),
            splice_event_id: 42,
            duration_ms: 30_000,
        }
    }

    #[tokio::test]
    async fn create_action_posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/ch-1/schedule"))
            .and(header("authorization", "Bearer chan-token-123"))
            .and(header("x-channel-region", "ap-northeast-2"))
            .and(body_json(serde_json::json!({
                "actionName": "adsynk-schedule_1",
                "startTime": "2026-03-01T01:00:00.000000Z",
                "spliceEventId": 42,
                "durationMs": 30000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .create_schedule_action("ch-1", &action())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn conflict_and_bad_request_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/ch-1/schedule"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "code": "ConflictException",
                "message": "action name already in use"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/channels/ch-2/schedule"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "BadRequestException",
                "message": "start time is in the past"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.create_schedule_action("ch-1", &action()).await.unwrap_err();
        assert!(matches!(err, AdsynkError::Conflict { .. }));
        let err = client.create_schedule_action("ch-2", &action()).await.unwrap_err();
        match err {
            AdsynkError::InvalidInput(msg) => assert_eq!(msg, "start time is in the past"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_not_found_names_the_action() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/channels/ch-1/schedule/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": "NotFoundException",
                "message": "no such action"
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .delete_schedule_action("ch-1", "gone")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdsynkError::NotFound {
                entity: "schedule action",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn describe_channel_and_plain_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/ch-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Sports HD",
                "state": "RUNNING"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/ch-9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let info = client.describe_channel("ch-1").await.unwrap();
        assert_eq!(info.name, "Sports HD");
        assert_eq!(info.channel_id, "ch-1");
        let err = client.describe_channel("ch-9").await.unwrap_err();
        assert!(matches!(err, AdsynkError::NotFound { entity: "channel", .. }));
    }

    #[tokio::test]
    async fn server_errors_are_upstream_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/ch-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let err = test_client(&server.uri())
            .describe_channel("ch-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AdsynkError::UpstreamFailure { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn endpoint_must_be_configured_and_valid() {
        assert!(matches!(
            HttpChannelClient::from_config(&ChannelConfig::default()).unwrap_err(),
            AdsynkError::Config(_)
        ));
        assert!(HttpChannelClient::new("not a url", None, "ap-northeast-2").is_err());
    }
}
