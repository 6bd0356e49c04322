//! HTTP client for the HabitAI server API

use habitai_server::coach::{ChatContext, HabitPlan, Message};
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use url::Url;

use crate::error::{CliError, CliResult};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

#[derive(Debug, Deserialize)]
struct PlanReply {
    plan: HabitPlan,
}

#[derive(Debug, Deserialize)]
struct AnalysisReply {
    analysis: String,
}

#[derive(Debug, Deserialize)]
struct HistoryReply {
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct SuccessReply {
    success: bool,
}

/// Client for one HabitAI server
#[derive(Debug, Clone)]
pub struct CoachClient {
    http: Client,
    base_url: Url,
}

impl CoachClient {
    pub fn new(server_url: &str) -> CliResult<Self> {
        let mut base_url = Url::parse(server_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> CliResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> CliResult<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(ErrorBody {
                    error,
                    message: Some(message),
                }) => format!("{error} ({message})"),
                Ok(ErrorBody { error, .. }) => error,
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            return Err(CliError(format!("Server returned {status}: {detail}")));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> CliResult<T> {
        let response = self.http.post(self.endpoint(path)?).json(&body).send().await?;
        Self::decode(response).await
    }

    pub async fn health(&self) -> CliResult<serde_json::Value> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        Self::decode(response).await
    }

    pub async fn chat(
        &self,
        message: &str,
        context: &ChatContext,
        voice_mode: bool,
        conversation_id: Option<&str>,
    ) -> CliResult<String> {
        let reply: ChatReply = self
            .post(
                "api/chat",
                json!({
                    "message": message,
                    "context": context,
                    "voiceMode": voice_mode,
                    "conversationId": conversation_id,
                }),
            )
            .await?;
        Ok(reply.response)
    }

    pub async fn habit_plan(&self, habit_description: &str) -> CliResult<HabitPlan> {
        let reply: PlanReply = self
            .post(
                "api/habit-plan",
                json!({ "habitDescription": habit_description }),
            )
            .await?;
        Ok(reply.plan)
    }

    pub async fn analyze_missed(&self, reason: &str, context: &ChatContext) -> CliResult<String> {
        let reply: AnalysisReply = self
            .post(
                "api/analyze-missed",
                json!({ "reason": reason, "context": context }),
            )
            .await?;
        Ok(reply.analysis)
    }

    pub async fn history(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> CliResult<Vec<Message>> {
        let mut query = vec![("conversationId", conversation_id.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .http
            .get(self.endpoint("api/chat/history")?)
            .query(&query)
            .send()
            .await?;
        let reply: HistoryReply = Self::decode(response).await?;
        Ok(reply.messages)
    }

    pub async fn reset(&self, conversation_id: &str) -> CliResult<()> {
        let reply: SuccessReply = self
            .post(
                "api/chat/reset",
                json!({ "conversationId": conversation_id }),
            )
            .await?;

        if reply.success {
            Ok(())
        } else {
            Err(CliError::from("Server did not confirm the reset"))
        }
    }
}
