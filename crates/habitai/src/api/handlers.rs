//! Route handlers for the coach API
//!
//! Bodies are read as raw bytes and parsed here so every malformed request
//! gets the JSON error payload instead of axum's plain-text rejection. An
//! empty body parses as an empty object. Field validation runs before the
//! credential check.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, Uri},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::api::conversation::ConversationId;
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::coach::{ChatContext, CoachService, HabitPlan, Message};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<ChatContext>,
    #[serde(default)]
    pub voice_mode: bool,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitPlanRequest {
    #[serde(default)]
    pub habit_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeMissedRequest {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub context: Option<ChatContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub conversation_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct HabitPlanResponse {
    pub success: bool,
    pub plan: HabitPlan,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

/// Parse a JSON object body; empty bodies count as `{}`
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {e}")))?;
    if !value.is_object() {
        return Err(ApiError::Validation(
            "Request body must be a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))
}

/// A present, non-empty field or the given validation error. Whitespace
/// counts as content.
fn required(value: Option<String>, error: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(error.to_string()))
}

fn parse_conversation_id(raw: Option<String>) -> Result<Option<ConversationId>, ApiError> {
    raw.map(ConversationId::try_from)
        .transpose()
        .map_err(ApiError::from)
}

fn coach(state: &AppState) -> Result<&Arc<CoachService>, ApiError> {
    state
        .coach
        .as_ref()
        .ok_or_else(|| ApiError::missing_credential(&state.api_key_env))
}

/// Service discovery document
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "HabitAI Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "upstreamConfigured": state.coach.is_some(),
        "endpoints": {
            "health": "GET /",
            "chat": "POST /api/chat",
            "habitPlan": "POST /api/habit-plan",
            "analyzeMissedDay": "POST /api/analyze-missed",
            "resetChat": "POST /api/chat/reset",
            "chatHistory": "GET /api/chat/history",
        }
    }))
}

pub async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<ChatResponse> {
    let request: ChatRequest = parse_body(&body)?;
    let message = required(request.message, "Message is required")?;
    let conversation_id = parse_conversation_id(request.conversation_id)?;
    let context = request.context.unwrap_or_default();
    let coach = coach(&state)?;

    debug!(
        conversation = ?conversation_id,
        voice_mode = request.voice_mode,
        "Chat request"
    );

    let response = match conversation_id {
        Some(id) => {
            let history = state.conversations.get_or_create(&id);
            let mut history = history.lock().await;
            coach
                .chat(&mut history, &message, &context, request.voice_mode)
                .await
        }
        None => {
            let mut history = state.conversations.ephemeral();
            coach
                .chat(&mut history, &message, &context, request.voice_mode)
                .await
        }
    };

    Ok(Json(ChatResponse {
        success: true,
        response,
    }))
}

pub async fn habit_plan_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<HabitPlanResponse> {
    let request: HabitPlanRequest = parse_body(&body)?;
    let description = required(request.habit_description, "Habit description is required")?;
    let coach = coach(&state)?;

    let plan = coach.create_habit_plan(&description).await;

    Ok(Json(HabitPlanResponse {
        success: true,
        plan,
    }))
}

pub async fn analyze_missed_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<AnalysisResponse> {
    let request: AnalyzeMissedRequest = parse_body(&body)?;
    let reason = required(request.reason, "Reason is required")?;
    let context = request.context.unwrap_or_default();
    let coach = coach(&state)?;

    let analysis = coach
        .analyze_missed_day(&reason, &context)
        .await
        .map_err(|e| ApiError::Upstream {
            error: "Failed to analyze missed day".to_string(),
            message: e.to_string(),
        })?;

    Ok(Json(AnalysisResponse {
        success: true,
        analysis,
    }))
}

pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<ResetResponse> {
    let request: ResetRequest = parse_body(&body)?;
    let raw = required(request.conversation_id, "conversationId is required")?;
    let id = ConversationId::try_from(raw)?;

    if let Some(history) = state.conversations.remove(&id) {
        // a turn still holding this history finishes before it is emptied
        history.lock().await.clear();
        info!("Reset conversation {id}");
    }

    Ok(Json(ResetResponse { success: true }))
}

pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<HistoryResponse> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let raw = required(query.conversation_id, "conversationId is required")?;
    let id = ConversationId::try_from(raw)?;
    let limit = query.limit.unwrap_or(state.recent_default);

    let messages = match state.conversations.get(&id) {
        Some(history) => history.lock().await.recent(limit),
        None => Vec::new(),
    };

    Ok(Json(HistoryResponse {
        success: true,
        messages,
    }))
}

pub async fn not_found_handler(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
