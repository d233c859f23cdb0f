use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::models::chat::ChatMessage;
use crate::services::game::CompletionProvider;
use crate::utils::error::CompletionError;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

/// Chat completion client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: LlmConfig,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// Generate a single completion and wait for the full response.
    pub async fn generate_chat(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError> {
        debug!("Starting chat generation with {} messages", messages.len());

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(format!("failed to call LLM API: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::AuthenticationFailure(format!(
                "{} - check llm.api_key and model access: {}",
                status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Transport(format!(
                "LLM API error: {} - {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Transport(format!("failed to parse LLM response: {}", e)))?;

        extract_answer(completion)
    }
}

/// An answer must be present and non-blank; anything else aborts the turn.
fn extract_answer(completion: ChatCompletionResponse) -> Result<String, CompletionError> {
    let answer = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(CompletionError::EmptyCompletion)?;
    if answer.trim().is_empty() {
        return Err(CompletionError::EmptyCompletion);
    }
    Ok(answer)
}

#[async_trait::async_trait]
impl CompletionProvider for LlmService {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionError> {
        self.generate_chat(messages).await
    }
}
