use crate::completion::{clean_completion_text, Completion, CompletionError, CompletionService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const CLAUDE_SONNET: &str = "claude-sonnet-4-20250514";

const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize, Clone)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

/// Primary completion backend.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn build_request(&self, system_prompt: &str, user_message: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: if system_prompt.is_empty() { None } else { Some(system_prompt.to_string()) },
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user_message.to_string(),
            }],
            temperature: 0.4,
        }
    }
}

#[async_trait]
impl CompletionService for AnthropicClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<Completion, CompletionError> {
        let request = self.build_request(system_prompt, user_message);

        let response = self.client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(api_error(status, &error_text));
        }

        let completion: MessagesResponse = response.json().await?;
        let model = completion.model.clone().unwrap_or_else(|| self.model.clone());
        extract_text(completion)
            .map(|content| Completion { content, model })
            .ok_or_else(|| CompletionError::EmptyResponse(self.model.clone()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn api_error(status: u16, body: &str) -> CompletionError {
    let message = match serde_json::from_str::<AnthropicError>(body) {
        Ok(parsed) => format!("{} - {}", parsed.error.error_type, parsed.error.message),
        Err(_) => body.to_string(),
    };
    CompletionError::Api { status, message }
}

/// Last text block wins; anything else (tool use, thinking) is skipped.
fn extract_text(response: MessagesResponse) -> Option<String> {
    response.content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .last()
        .and_then(|c| c.text)
        .and_then(|t| clean_completion_text(&t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_empty_system_prompt() {
        let client = AnthropicClient::new("key", CLAUDE_SONNET, Duration::from_secs(5)).unwrap();

        let request = client.build_request("", "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");

        let request = client.build_request("You help students.", "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "You help students.");
        assert_eq!(json["model"], CLAUDE_SONNET);
    }

    #[test]
    fn extract_text_takes_last_text_block() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking","text":null},{"type":"text","text":"draft"},{"type":"text","text":"final"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("final"));

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(extract_text(empty), None);
    }

    #[test]
    fn api_error_prefers_structured_body() {
        let err = api_error(429, r#"{"error":{"type":"rate_limit_error","message":"slow down"}}"#);
        assert!(matches!(
            err,
            CompletionError::Api { status: 429, ref message } if message == "rate_limit_error - slow down"
        ));

        let err = api_error(502, "Bad Gateway");
        assert!(matches!(err, CompletionError::Api { status: 502, ref message } if message == "Bad Gateway"));
    }
}
