//! Test utilities - a scripted upstream for exercising the coach without HTTP
//!
//! `ScriptedProvider` answers each attempt from a queue of canned results and
//! records what it was asked, so tests can assert call counts, request
//! contents, and the spacing between attempts. An optional delay makes each
//! answer take time on the tokio clock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::upstream::{CompletionProvider, CompletionRequest, UpstreamError};

type Scripted = Result<String, UpstreamError>;

#[derive(Debug, Default)]
struct Recorded {
    requests: Vec<CompletionRequest>,
    call_times: Vec<Instant>,
    finish_times: Vec<Instant>,
}

/// Fake upstream replaying a fixed script of results
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    /// Returned once the script runs out
    repeat: Scripted,
    delay: Option<Duration>,
    recorded: Mutex<Recorded>,
}

impl ScriptedProvider {
    /// Replay `results` in order; once exhausted every call fails with a
    /// transport error.
    pub fn new(results: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            repeat: Err(UpstreamError::Transport("script exhausted".to_string())),
            delay: None,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Answer every call with `result`
    pub fn always(result: Scripted) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: result,
            delay: None,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Sleep for `delay` before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of attempts made so far
    pub fn calls(&self) -> usize {
        self.recorded().requests.len()
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.recorded().requests.clone()
    }

    /// When each attempt arrived, on the tokio clock
    pub fn call_times(&self) -> Vec<Instant> {
        self.recorded().call_times.clone()
    }

    /// When each attempt answered, on the tokio clock
    pub fn finish_times(&self) -> Vec<Instant> {
        self.recorded().finish_times.clone()
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        {
            let mut recorded = self.recorded();
            recorded.requests.push(request.clone());
            recorded.call_times.push(Instant::now());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        self.recorded().finish_times.push(Instant::now());
        next.unwrap_or_else(|| self.repeat.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::Message;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![Message::user("hi")], 150)
    }

    #[tokio::test]
    async fn scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new(vec![Ok("a".to_string()), Ok("b".to_string())]);

        assert_eq!(provider.complete(&request()).await, Ok("a".to_string()));
        assert_eq!(provider.complete(&request()).await, Ok("b".to_string()));
        assert!(matches!(
            provider.complete(&request()).await,
            Err(UpstreamError::Transport(_))
        ));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn scripted_provider_always_repeats() {
        let provider = ScriptedProvider::always(Ok("same".to_string()));
        for _ in 0..3 {
            assert_eq!(provider.complete(&request()).await, Ok("same".to_string()));
        }
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.call_times().len(), 3);
        assert_eq!(provider.finish_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_provider_delays_answers() {
        let provider =
            ScriptedProvider::always(Ok("slow".to_string())).with_delay(Duration::from_millis(250));

        assert_eq!(provider.complete(&request()).await, Ok("slow".to_string()));
        let elapsed = provider.finish_times()[0] - provider.call_times()[0];
        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_millis(260));
    }
}
