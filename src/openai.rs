use crate::completion::{clean_completion_text, Completion, CompletionError, CompletionService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GPT_4O_MINI: &str = "gpt-4o-mini";

#[derive(Debug, Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Secondary completion backend; any OpenAI-compatible chat completions endpoint.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_messages(system_prompt: &str, user_message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user_message.to_string(),
        });
        messages
    }
}

#[async_trait]
impl CompletionService for OpenAIClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<Completion, CompletionError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system_prompt, user_message),
            temperature: 0.5,
            max_tokens: Some(800),
        };

        let response = self.client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, message });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let model = completion.model.clone().unwrap_or_else(|| self.model.clone());

        completion.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .and_then(|t| clean_completion_text(&t))
            .map(|content| Completion { content, model })
            .ok_or_else(|| CompletionError::EmptyResponse(self.model.clone()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
