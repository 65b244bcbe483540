/// HTTP `CoachModel` adapter over the Anthropic Messages API
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use std::time::Duration;

use crate::domain::models::ModelConfig;
use crate::domain::ports::{CoachModel, ModelRequest};

use super::error::ModelApiError;
use super::retry::RetryPolicy;
use super::types::{Message, MessageRequest, MessageResponse};

/// Production HTTP client for the Messages API
///
/// Features:
/// - Connection pooling and reuse (via `reqwest::Client`)
/// - Exponential backoff retry for transient errors
/// - Transient vs permanent error classification
///
/// Both port methods go through the same request path; the extraction and
/// render calls differ only in the prompts the services build.
pub struct AnthropicCoachModel {
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    model: String,
    retry_policy: RetryPolicy,
}

impl AnthropicCoachModel {
    /// Builds a client from configuration. Fails when no API key is
    /// configured or the HTTP client cannot be constructed.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .context("no API key configured (set model.api_key or ANTHROPIC_API_KEY)")?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.initial_backoff_ms,
                config.max_backoff_ms,
            ),
        })
    }

    async fn send_request(&self, request: &MessageRequest) -> Result<MessageResponse, ModelApiError> {
        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelApiError::Timeout
                } else {
                    ModelApiError::NetworkError(e)
                }
            })?;

        match response.status() {
            status if status.is_success() => {
                response.json().await.map_err(ModelApiError::NetworkError)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ModelApiError::AuthenticationFailed(
                    response.text().await.unwrap_or_default(),
                ))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ModelApiError::RateLimitExceeded),
            status if status.as_u16() == 529 => Err(ModelApiError::Overloaded),
            status if status.is_server_error() => Err(ModelApiError::ServerError(format!(
                "{status}: {}",
                response.text().await.unwrap_or_default()
            ))),
            status => Err(ModelApiError::InvalidRequest(format!(
                "{status}: {}",
                response.text().await.unwrap_or_default()
            ))),
        }
    }

    async fn complete(&self, request: ModelRequest) -> Result<String> {
        let api_request = MessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user(request.prompt)],
            max_tokens: request.max_tokens,
            system: Some(request.system),
            temperature: Some(request.temperature),
        };

        let response = self
            .retry_policy
            .execute(|| self.send_request(&api_request))
            .await
            .context("model call failed")?;

        Ok(response.text())
    }
}

#[async_trait]
impl CoachModel for AnthropicCoachModel {
    async fn extract(&self, request: ModelRequest) -> Result<String> {
        self.complete(request).await
    }

    async fn render(&self, request: ModelRequest) -> Result<String> {
        self.complete(request).await
    }
}
