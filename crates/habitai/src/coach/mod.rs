//! Habit coach: chat, habit plans, and missed-day analysis
//!
//! `CoachService` ties the request builder, retry policy, fallback messages,
//! plan extraction, and voice post-processing to a `CompletionProvider`.
//! It owns no conversation state; callers pass the history of the
//! conversation they are serving.

pub mod fallback;
pub mod history;
pub mod plan;
pub mod prompts;
pub mod request;
pub mod types;
pub mod voice;

pub use fallback::{TIMEOUT_FALLBACK, UNAVAILABLE_FALLBACK, fallback_message};
pub use history::{ConversationHistory, DEFAULT_MAX_MESSAGES, DEFAULT_RECENT_LIMIT};
pub use plan::{default_plan, extract_habit_plan};
pub use request::{build_chat_messages, render_context};
pub use types::{ChatContext, HabitPlan, Message, Role};
pub use voice::prepare_for_voice;

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::upstream::{CompletionProvider, CompletionRequest, RetryPolicy, UpstreamError};
use prompts::{HABIT_PLAN_PROMPT, MISSED_DAY_PROMPT};

/// Token cap for chat and analysis answers
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// Token cap for habit plan answers
pub const DEFAULT_PLAN_MAX_TOKENS: u32 = 200;

pub struct CoachService {
    provider: Arc<dyn CompletionProvider>,
    retry: RetryPolicy,
    max_tokens: u32,
    plan_max_tokens: u32,
}

impl CoachService {
    pub fn new(provider: Arc<dyn CompletionProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            retry,
            max_tokens: DEFAULT_MAX_TOKENS,
            plan_max_tokens: DEFAULT_PLAN_MAX_TOKENS,
        }
    }

    pub fn with_token_limits(mut self, max_tokens: u32, plan_max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self.plan_max_tokens = plan_max_tokens;
        self
    }

    /// Answer one chat turn. Always produces text: upstream failures become
    /// a fallback message.
    ///
    /// The user message is recorded in `history`; the assistant answer is
    /// recorded only when the upstream produced one.
    pub async fn chat(
        &self,
        history: &mut ConversationHistory,
        message: &str,
        context: &ChatContext,
        voice_mode: bool,
    ) -> String {
        let messages = build_chat_messages(history, message, context, voice_mode);
        let request = CompletionRequest::new(messages, self.max_tokens);

        let answer = match self.retry.complete(self.provider.as_ref(), &request).await {
            Ok(answer) => {
                history.append(Message::assistant(answer.clone()));
                answer
            }
            Err(e) => {
                error!(
                    provider = self.provider.name(),
                    error_type = e.category(),
                    "Upstream unavailable, answering with fallback: {e}"
                );
                fallback_message(&e).to_string()
            }
        };

        if voice_mode {
            prepare_for_voice(&answer)
        } else {
            answer
        }
    }

    /// Create a Tiny Habits plan. Never fails: upstream errors and unusable
    /// answers both yield the default plan.
    pub async fn create_habit_plan(&self, habit_description: &str) -> HabitPlan {
        let prompt = HABIT_PLAN_PROMPT.replace("{habit_description}", habit_description);
        let request = CompletionRequest::new(
            vec![
                Message::system(prompts::SYSTEM_PROMPT),
                Message::user(prompt),
            ],
            self.plan_max_tokens,
        );

        match self.retry.complete(self.provider.as_ref(), &request).await {
            Ok(answer) => {
                debug!("Habit plan response: {answer}");
                extract_habit_plan(&answer, habit_description)
            }
            Err(e) => {
                warn!(
                    error_type = e.category(),
                    "Habit plan generation failed, using default plan: {e}"
                );
                default_plan(habit_description)
            }
        }
    }

    /// Analyze why a day was missed. Upstream failure after retries is
    /// returned to the caller.
    pub async fn analyze_missed_day(
        &self,
        reason: &str,
        context: &ChatContext,
    ) -> Result<String, UpstreamError> {
        let prompt = MISSED_DAY_PROMPT
            .replace("{context}", &render_context(context))
            .replace("{reason}", reason);
        let request = CompletionRequest::new(
            vec![
                Message::system(prompts::SYSTEM_PROMPT),
                Message::user(prompt),
            ],
            self.max_tokens,
        );

        self.retry
            .complete(self.provider.as_ref(), &request)
            .await
            .inspect_err(|e| {
                error!(
                    error_type = e.category(),
                    "Missed day analysis failed: {e}"
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use std::time::Duration;
    use tokio::time::Instant;

    fn timeout() -> UpstreamError {
        UpstreamError::Timeout(Duration::from_secs(30))
    }

    fn http_error(status: u16) -> UpstreamError {
        UpstreamError::Http {
            status,
            body: String::new(),
        }
    }

    fn coach(provider: &Arc<ScriptedProvider>) -> CoachService {
        CoachService::new(provider.clone(), RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_timeout_every_attempt() {
        let provider = Arc::new(ScriptedProvider::always(Err(timeout())));
        let coach = coach(&provider);
        let mut history = ConversationHistory::default();

        let answer = coach
            .chat(&mut history, "hi", &ChatContext::default(), false)
            .await;

        assert_eq!(answer, TIMEOUT_FALLBACK);
        assert_eq!(provider.calls(), 4);

        let times = provider.call_times();
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps.len(), 3);
        for (gap, expected) in gaps.iter().zip([1000, 2000, 4000]) {
            let expected = Duration::from_millis(expected);
            assert!(
                *gap >= expected && *gap < expected + Duration::from_millis(10),
                "gap {gap:?}, expected {expected:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_succeeds_on_third_attempt() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(http_error(502)),
            Err(timeout()),
            Ok("**You** can do it!\nOne step.".to_string()),
        ]));
        let coach = coach(&provider);
        let mut history = ConversationHistory::default();

        let answer = coach
            .chat(&mut history, "hi", &ChatContext::default(), false)
            .await;

        assert_eq!(answer, "**You** can do it!\nOne step.");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_chat_records_turn_in_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("First answer".to_string()),
            Ok("Second answer".to_string()),
        ]));
        let coach = coach(&provider);
        let mut history = ConversationHistory::default();

        coach
            .chat(&mut history, "first", &ChatContext::default(), false)
            .await;
        coach
            .chat(&mut history, "second", &ChatContext::default(), false)
            .await;

        assert_eq!(
            history.recent(10),
            vec![
                Message::user("first"),
                Message::assistant("First answer"),
                Message::user("second"),
                Message::assistant("Second answer"),
            ]
        );

        // The second request carried the first turn
        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 5);
        assert_eq!(requests[1].messages[2], Message::user("first"));
        assert_eq!(requests[1].max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_chat_fallback_not_recorded_as_assistant() {
        let provider = Arc::new(ScriptedProvider::always(Err(
            UpstreamError::MalformedResponse("no content".to_string()),
        )));
        let coach = coach(&provider);
        let mut history = ConversationHistory::default();

        let answer = coach
            .chat(&mut history, "hi", &ChatContext::default(), false)
            .await;

        assert_eq!(answer, UNAVAILABLE_FALLBACK);
        assert_eq!(provider.calls(), 1);
        assert_eq!(history.recent(10), vec![Message::user("hi")]);
    }

    #[tokio::test]
    async fn test_chat_voice_mode_post_processes() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "**Great** job!\n_Keep_ going".to_string(),
        )]));
        let coach = coach(&provider);
        let mut history = ConversationHistory::default();

        let answer = coach
            .chat(&mut history, "hi", &ChatContext::default(), true)
            .await;

        assert_eq!(answer, "Great job! Keep going");
        // History keeps the raw answer
        assert_eq!(
            history.recent(1),
            vec![Message::assistant("**Great** job!\n_Keep_ going")]
        );
        assert!(provider.requests()[0].messages[0]
            .content
            .ends_with(prompts::VOICE_MODE_DIRECTIVE));
    }

    #[tokio::test]
    async fn test_create_habit_plan() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            r#"Sure! {"tinyVersion":"x","trigger":"y","time":"08:00","motivation":"z"} enjoy"#
                .to_string(),
        )]));
        let coach = coach(&provider);

        let plan = coach.create_habit_plan("read").await;

        assert_eq!(plan.tiny_version, "x");
        assert_eq!(plan.time, "08:00");

        let request = &provider.requests()[0];
        assert_eq!(request.max_tokens, DEFAULT_PLAN_MAX_TOKENS);
        assert!(request.messages[1].content.contains("\"read\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_habit_plan_degrades_to_default() {
        let provider = Arc::new(ScriptedProvider::always(Err(http_error(500))));
        let coach = coach(&provider);
        let start = Instant::now();

        let plan = coach.create_habit_plan("drink water").await;

        assert_eq!(plan, default_plan("drink water"));
        assert_eq!(provider.calls(), 4);
        assert!(start.elapsed() >= Duration::from_millis(7000));
    }

    #[tokio::test]
    async fn test_analyze_missed_day() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "Rest is part of progress 💪".to_string(),
        )]));
        let coach = coach(&provider);
        let context = ChatContext {
            habit_name: "Yoga".to_string(),
            current_day: 9,
            streak: 0,
            ..ChatContext::default()
        };

        let analysis = coach.analyze_missed_day("I was sick", &context).await;

        assert_eq!(analysis.unwrap(), "Rest is part of progress 💪");
        let prompt = &provider.requests()[0].messages[1].content;
        assert!(prompt.contains("Reason: \"I was sick\""));
        assert!(prompt.contains("Habit: Yoga\nDay: 9/66"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_missed_day_propagates_failure() {
        let provider = Arc::new(ScriptedProvider::always(Err(timeout())));
        let coach = coach(&provider);

        let result = coach
            .analyze_missed_day("busy", &ChatContext::default())
            .await;

        assert_eq!(result, Err(timeout()));
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_custom_token_limits() {
        let provider = Arc::new(ScriptedProvider::always(Ok("ok".to_string())));
        let coach = coach(&provider).with_token_limits(64, 96);
        let mut history = ConversationHistory::default();

        coach
            .chat(&mut history, "hi", &ChatContext::default(), false)
            .await;
        coach.create_habit_plan("walk").await;

        let requests = provider.requests();
        assert_eq!(requests[0].max_tokens, 64);
        assert_eq!(requests[1].max_tokens, 96);
    }
}
