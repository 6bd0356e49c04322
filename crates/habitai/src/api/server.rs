//! HTTP server for the coach API
//!
//! Routes are registered twice: under `/api` and under the legacy
//! `/api/grog` prefix that older mobile builds still call.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::api::conversation::ConversationRegistry;
use crate::api::error::ApiError;
use crate::api::handlers::{
    analyze_missed_handler, chat_handler, habit_plan_handler, health_handler, history_handler,
    not_found_handler, reset_handler,
};
use crate::coach::CoachService;
use crate::config::{Config, HistoryConfig};
use crate::error::{CoachError, Result};
use crate::upstream::{RetryPolicy, UpstreamClient};

/// Legacy route prefix kept as an alias of `/api`
pub const LEGACY_PREFIX: &str = "/api/grog";

/// Shared application state for all handlers
pub struct AppState {
    /// `None` when no upstream credential is configured
    pub coach: Option<Arc<CoachService>>,
    pub conversations: ConversationRegistry,
    /// History messages returned when the caller gives no limit
    pub recent_default: usize,
    /// Environment variable the credential is read from, for error messages
    pub api_key_env: String,
}

impl AppState {
    pub fn new(coach: Option<Arc<CoachService>>, history: &HistoryConfig, api_key_env: &str) -> Self {
        Self {
            coach,
            conversations: ConversationRegistry::new(
                history.max_messages,
                history.max_conversations,
            ),
            recent_default: history.recent_default,
            api_key_env: api_key_env.to_string(),
        }
    }

    /// Build the coach from configuration. A missing credential leaves the
    /// coach unset rather than failing; coach endpoints then answer 500.
    pub fn from_config(config: &Config) -> Result<Self> {
        let coach = match config.upstream.api_key() {
            Some(api_key) => {
                let client = UpstreamClient::new(&config.upstream, api_key)?;
                let retry = RetryPolicy::new(config.retry.delays());
                tracing::info!(
                    "Retry policy: {} attempts, delays {:?}ms",
                    retry.max_attempts(),
                    config.retry.delays_ms
                );
                let coach = CoachService::new(Arc::new(client), retry).with_token_limits(
                    config.upstream.max_tokens,
                    config.upstream.plan_max_tokens,
                );
                Some(Arc::new(coach))
            }
            None => {
                tracing::warn!(
                    "{} is not set; coach endpoints will answer with a configuration error",
                    config.upstream.api_key_env
                );
                None
            }
        };

        Ok(Self::new(coach, &config.history, &config.upstream.api_key_env))
    }

    /// State around an explicit coach, with default history limits
    pub fn with_coach(coach: CoachService) -> Self {
        Self::new(
            Some(Arc::new(coach)),
            &HistoryConfig::default(),
            "HABITAI_API_KEY",
        )
    }
}

/// The coach API server
pub struct ApiServer {
    config: Config,
}

impl ApiServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the server and listen for requests until Ctrl+C or SIGTERM
    pub async fn serve(&self) -> Result<()> {
        let state = Arc::new(AppState::from_config(&self.config)?);
        let app = create_router(state);

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| CoachError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting HabitAI server on {addr}");
        tracing::info!("Upstream API: {}", self.config.upstream.api_url);
        tracing::info!("Legacy routes enabled under {LEGACY_PREFIX}");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CoachError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CoachError::Server(format!("Server error: {e}")))?;

        tracing::info!("HabitAI server shut down gracefully");
        Ok(())
    }
}

fn coach_routes(prefix: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{prefix}/chat"),
            post(chat_handler).fallback(not_found_handler),
        )
        .route(
            &format!("{prefix}/habit-plan"),
            post(habit_plan_handler).fallback(not_found_handler),
        )
        .route(
            &format!("{prefix}/analyze-missed"),
            post(analyze_missed_handler).fallback(not_found_handler),
        )
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler).fallback(not_found_handler))
        .route(
            "/api/chat/reset",
            post(reset_handler).fallback(not_found_handler),
        )
        .route(
            "/api/chat/history",
            get(history_handler).fallback(not_found_handler),
        )
        .merge(coach_routes("/api"))
        .merge(coach_routes(LEGACY_PREFIX))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(message).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::Message;
    use crate::testing::ScriptedProvider;
    use crate::upstream::UpstreamError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_without_coach() -> Arc<AppState> {
        Arc::new(AppState::new(
            None,
            &HistoryConfig::default(),
            "HABITAI_API_KEY",
        ))
    }

    fn state_with(provider: Arc<ScriptedProvider>) -> Arc<AppState> {
        Arc::new(AppState::with_coach(CoachService::new(
            provider,
            RetryPolicy::no_retry(),
        )))
    }

    async fn send(
        state: Arc<AppState>,
        method: &str,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, json) = send(state_without_coach(), "GET", "/", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["message"], "HabitAI Backend API");
        assert_eq!(json["upstreamConfigured"], false);
        assert_eq!(json["endpoints"]["chat"], "POST /api/chat");
    }

    #[tokio::test]
    async fn test_chat_empty_body_is_bad_request() {
        let (status, json) = send(state_without_coach(), "POST", "/api/chat", "").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_whitespace_message_is_forwarded() {
        let provider = Arc::new(ScriptedProvider::always(Ok("Take your time.".to_string())));
        let (status, json) = send(
            state_with(provider.clone()),
            "POST",
            "/api/chat",
            r#"{"message":"   "}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Take your time.");
        let request = &provider.requests()[0];
        assert_eq!(request.messages.last(), Some(&Message::user("   ")));
    }

    #[tokio::test]
    async fn test_chat_without_credential_is_server_error() {
        let (status, json) =
            send(state_without_coach(), "POST", "/api/chat", r#"{"message":"hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "API key not configured");
        assert!(json["message"].as_str().unwrap().contains("HABITAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_chat_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("Keep going!".to_string())]));
        let (status, json) =
            send(state_with(provider), "POST", "/api/chat", r#"{"message":"hi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"success": true, "response": "Keep going!"}));
    }

    #[tokio::test]
    async fn test_chat_fallback_is_still_ok() {
        let provider = Arc::new(ScriptedProvider::always(Err(UpstreamError::Http {
            status: 503,
            body: String::new(),
        })));
        let (status, json) =
            send(state_with(provider), "POST", "/api/chat", r#"{"message":"hi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], crate::coach::UNAVAILABLE_FALLBACK);
    }

    #[tokio::test]
    async fn test_legacy_prefix_routes() {
        let provider = Arc::new(ScriptedProvider::always(Ok("hello".to_string())));
        let (status, json) = send(
            state_with(provider),
            "POST",
            "/api/grog/chat",
            r#"{"message":"hi"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "hello");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let (status, json) = send(state_without_coach(), "GET", "/api/unknown", "").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Not found",
                "message": "Endpoint GET /api/unknown not found"
            })
        );
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_not_found() {
        let (status, json) = send(state_without_coach(), "GET", "/api/chat", "").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Endpoint GET /api/chat not found");
    }

    #[tokio::test]
    async fn test_conversation_history_and_reset() {
        let provider = Arc::new(ScriptedProvider::always(Ok("Nice!".to_string())));
        let state = state_with(provider);

        send(
            state.clone(),
            "POST",
            "/api/chat",
            r#"{"message":"did it","conversationId":"c1"}"#,
        )
        .await;

        let (status, json) = send(
            state.clone(),
            "GET",
            "/api/chat/history?conversationId=c1",
            "",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let messages: Vec<Message> = serde_json::from_value(json["messages"].clone()).unwrap();
        assert_eq!(
            messages,
            vec![Message::user("did it"), Message::assistant("Nice!")]
        );

        let (status, json) = send(
            state.clone(),
            "POST",
            "/api/chat/reset",
            r#"{"conversationId":"c1"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);

        let (_, json) = send(state, "GET", "/api/chat/history?conversationId=c1", "").await;
        assert_eq!(json["messages"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_reset_forgets_conversation() {
        let provider = Arc::new(ScriptedProvider::always(Ok("Logged.".to_string())));
        let state = state_with(provider);

        for i in 0..500 {
            let chat = format!(r#"{{"message":"day {i}","conversationId":"device-{i}"}}"#);
            let (status, _) = send(state.clone(), "POST", "/api/chat", &chat).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(state.conversations.len(), 1);

            let reset = format!(r#"{{"conversationId":"device-{i}"}}"#);
            let (status, _) = send(state.clone(), "POST", "/api/chat/reset", &reset).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(state.conversations.len(), 0);
        }

        // resetting an unknown conversation still succeeds and stores nothing
        let (status, json) = send(
            state.clone(),
            "POST",
            "/api/chat/reset",
            r#"{"conversationId":"never-started"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(state.conversations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_conversation_chats_run_one_at_a_time() {
        let provider = Arc::new(
            ScriptedProvider::always(Ok("On it.".to_string())).with_delay(Duration::from_millis(500)),
        );
        let state = state_with(provider.clone());

        let ((first, _), (second, _)) = tokio::join!(
            send(
                state.clone(),
                "POST",
                "/api/chat",
                r#"{"message":"first","conversationId":"shared"}"#,
            ),
            send(
                state.clone(),
                "POST",
                "/api/chat",
                r#"{"message":"second","conversationId":"shared"}"#,
            ),
        );
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);

        // persona + context + one user turn, then the finished turn plus a new user turn
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[1].messages.len(), 5);
        assert_eq!(requests[1].messages[3], Message::assistant("On it."));

        let (started, finished) = (provider.call_times(), provider.finish_times());
        assert!(started[1] >= finished[0], "upstream calls overlapped");

        let history = state
            .conversations
            .get(&"shared".parse().unwrap())
            .unwrap();
        assert_eq!(history.lock().await.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_conversations_run_concurrently() {
        let provider = Arc::new(
            ScriptedProvider::always(Ok("Sure.".to_string())).with_delay(Duration::from_millis(500)),
        );
        let state = state_with(provider.clone());

        tokio::join!(
            send(
                state.clone(),
                "POST",
                "/api/chat",
                r#"{"message":"hi","conversationId":"alpha"}"#,
            ),
            send(
                state.clone(),
                "POST",
                "/api/chat",
                r#"{"message":"hi","conversationId":"beta"}"#,
            ),
        );

        let (started, finished) = (provider.call_times(), provider.finish_times());
        assert!(started[1] < finished[0]);
        assert_eq!(provider.requests()[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_history_requires_conversation_id() {
        let (status, json) = send(state_without_coach(), "GET", "/api/chat/history", "").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "conversationId is required");
    }

    #[test]
    fn test_handle_panic_builds_internal_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
