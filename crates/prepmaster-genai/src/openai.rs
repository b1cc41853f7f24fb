//! `OpenAI`-compatible chat completions client.
//!
//! Works with any server that speaks `/v1/chat/completions`, hosted or local.

use async_trait::async_trait;
use prepmaster_orchestrator::GeneratorConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{status_error, ContentService, GenAiError};

const SYSTEM_PROMPT: &str =
    "You are an experienced technical interviewer. Reply with JSON only, no prose.";

/// Client for chat completions endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Builds a client from the generator config.
    pub fn new(config: &GeneratorConfig, api_key: SecretString) -> Result<Self, GenAiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// Appends the schema to the prompt, since chat completions has no schema field.
fn with_schema(prompt: &str, schema: &Value) -> String {
    format!("{prompt}\n\nThe reply must be JSON matching this schema:\n{schema}")
}

#[async_trait]
impl ContentService for OpenAiClient {
    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<String, GenAiError> {
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: with_schema(prompt, schema),
                },
            ],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            tracing::warn!(error = %err, "Chat completion request failed");
            return Err(err);
        }

        let body: ChatResponse = response.json().await?;
        let text: String = body
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(GenAiError::EmptyResponse);
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
