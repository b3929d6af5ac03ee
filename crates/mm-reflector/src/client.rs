//! The LLM call itself (§6, §7). A failed call or an unparseable response
//! aborts the reflection cycle — no proposal is created, no state changes
//! (§7). Left generic over the wire format via [`LlmClient`] so tests can
//! substitute a canned responder without touching the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw JSON object the model produced (already extracted
    /// from whatever chat-completion envelope the provider wraps it in).
    /// `Err` covers both transport failures and a response that isn't
    /// valid JSON — both are `LLM errors` in §7's taxonomy.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<Value>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// An OpenAI-chat-completions-compatible client, used against whatever
/// `baseUrl`/`model` the runtime config names (§6's `model` field).
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "reflector/llm-call-failed"))?
            .error_for_status()
            .inspect_err(|e| warn!(error = %e, "reflector/llm-error-status"))?
            .json::<ChatResponse>()
            .await
            .inspect_err(|e| warn!(error = %e, "reflector/llm-response-undecodable"))?;

        let content = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("LLM response had no choices"))?
            .message
            .content;

        let parsed: Value = serde_json::from_str(&content).inspect_err(|e| warn!(error = %e, "reflector/llm-output-unparseable"))?;
        Ok(parsed)
    }
}
