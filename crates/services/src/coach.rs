use std::env;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::history::HistoryService;

/// History rows included in the coaching context.
const CONTEXT_HISTORY_LIMIT: u32 = 8;

/// Guardrail: the coach gives practice guidance, never medical advice.
const SYSTEM_PROMPT: &str = "\
You are a voice coach acting strictly in a non-medical capacity.
- Provide only safe, general guidance: warmups, cooldowns, breathwork, posture, hydration, practice plans.
- Do NOT give medical advice, diagnoses, or treatment. If asked, politely refuse and suggest consulting a medical professional.
- Use the user's latest report and history to personalize coaching, celebrate progress, and suggest next steps.
- Keep tone encouraging, specific, and actionable.";

#[derive(Clone, Debug)]
pub struct CoachConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl CoachConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("VOICE_COACH_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("VOICE_COACH_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".into());
        let model = env::var("VOICE_COACH_MODEL")
            .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Single-turn chat relay that personalizes replies with stored metrics.
///
/// One user turn in, one reply out; no conversation state is kept on
/// either side.
#[derive(Clone)]
pub struct CoachService {
    client: Client,
    config: Option<CoachConfig>,
    history: Arc<HistoryService>,
}

impl CoachService {
    #[must_use]
    pub fn from_env(history: Arc<HistoryService>) -> Self {
        Self::new(CoachConfig::from_env(), history)
    }

    #[must_use]
    pub fn new(config: Option<CoachConfig>, history: Arc<HistoryService>) -> Self {
        Self {
            client: Client::new(),
            config,
            history,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send one question with the user's recent metrics and relay the reply.
    ///
    /// # Errors
    ///
    /// Returns `CoachError` when the service is disabled, history cannot be
    /// loaded, the request fails, or the reply is empty.
    pub async fn ask(&self, question: &str) -> Result<String, CoachError> {
        let config = self.config.as_ref().ok_or(CoachError::Disabled)?;

        let context = self.build_context().await?;
        let url = format!("{}/messages", config.base_url.trim_end_matches('/'));
        let payload = MessagesRequest {
            model: config.model.clone(),
            max_tokens: 800,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![Message {
                role: "user",
                content: format!("Context:\n{context}\n\nUser says: {question}"),
            }],
        };

        let response = self
            .client
            .post(url)
            .header("x-api-key", &config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoachError::HttpStatus(response.status()));
        }

        let body: MessagesResponse = response.json().await?;
        let reply: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(CoachError::EmptyResponse);
        }
        Ok(reply)
    }

    async fn build_context(&self) -> Result<String, CoachError> {
        let latest = self.history.latest_report().await?;
        let rows = self.history.list_history(CONTEXT_HISTORY_LIMIT).await?;

        let latest_json = match &latest {
            Some(record) => serde_json::to_string_pretty(record)?,
            None => "{}".to_string(),
        };
        let history_json = serde_json::to_string_pretty(&rows)?;

        Ok(format!(
            "LATEST REPORT (0-100 unless noted):\n{latest_json}\n\n\
             HISTORY (most recent first, truncated):\n{history_json}"
        ))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
