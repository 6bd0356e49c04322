//! HTTP client for OpenAI-compatible chat completion endpoints
//!
//! Sends the assembled messages with a bearer credential, fixed temperature
//! and token cap, under a hard per-attempt deadline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::coach::types::Message;
use crate::config::UpstreamConfig;
use crate::error::{CoachError, Result};
use crate::upstream::{CompletionProvider, CompletionRequest, UpstreamError};

/// Longest upstream error body kept for logging
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for the configured upstream model API
#[derive(Debug)]
pub struct UpstreamClient {
    client: Client,
    api_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl UpstreamClient {
    /// Create a client for the configured endpoint with the given credential
    pub fn new(config: &UpstreamConfig, api_key: String) -> Result<Self> {
        let api_url = Url::parse(&config.api_url).map_err(|e| {
            CoachError::Config(format!("Invalid upstream URL '{}': {e}", config.api_url))
        })?;

        let client = Client::builder()
            .build()
            .map_err(|e| CoachError::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "UpstreamClient initialized with model: {}, api_url: {}",
            config.model, api_url
        );

        Ok(Self {
            client,
            api_url,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
        })
    }

    /// Override the per-attempt deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, request: &CompletionRequest) -> std::result::Result<String, UpstreamError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: self.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body: error_text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        parse_completion(&bytes)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else if e.is_connect() {
            UpstreamError::Transport(format!("Failed to connect to upstream: {e}"))
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

/// Extract `choices[0].message.content` from a completion body
fn parse_completion(bytes: &[u8]) -> std::result::Result<String, UpstreamError> {
    let completion: ChatCompletionResponse = serde_json::from_slice(bytes)
        .map_err(|e| UpstreamError::MalformedResponse(format!("Invalid JSON body: {e}")))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            UpstreamError::MalformedResponse("Missing choices[0].message.content".to_string())
        })
}

#[async_trait]
impl CompletionProvider for UpstreamClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, UpstreamError> {
        debug!(
            "Calling upstream at {} with {} messages",
            self.api_url,
            request.messages.len()
        );

        // Dropping the send future on deadline aborts the connection.
        match tokio::time::timeout(self.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }

    fn name(&self) -> &'static str {
        "upstream"
    }
}
