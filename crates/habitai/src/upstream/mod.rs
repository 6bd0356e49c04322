//! Upstream model API access
//!
//! The `CompletionProvider` trait abstracts the chat completion endpoint so the
//! coach can run against the real HTTP client or a scripted fake.

mod client;
mod error;
mod retry;

pub use client::UpstreamClient;
pub use error::UpstreamError;
pub use retry::{DEFAULT_RETRY_DELAYS, RetryPolicy};

use async_trait::async_trait;

use crate::coach::types::Message;

/// One chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Ordered messages: system prompts, history, then the new user turn
    pub messages: Vec<Message>,
    /// Response length cap in tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            messages,
            max_tokens,
        }
    }
}

/// A source of single-text chat completions
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Perform one attempt. Retrying is the caller's concern.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
