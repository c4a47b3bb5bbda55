use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text produced by a remote completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub model: String,
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("No text in response from {0}")]
    EmptyResponse(String),
    #[error("Completion service not configured: {0}")]
    NotConfigured(String),
}

/// A remote generative model that turns a system prompt plus user message into text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<Completion, CompletionError>;

    /// Provenance tag reported on replies from this service.
    fn model(&self) -> &str;
}

/// Stand-in for a backend with no API key; always fails so the caller falls through.
pub struct UnconfiguredService {
    name: String,
}

impl UnconfiguredService {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl CompletionService for UnconfiguredService {
    async fn complete(&self, _system_prompt: &str, _user_message: &str) -> Result<Completion, CompletionError> {
        Err(CompletionError::NotConfigured(self.name.clone()))
    }

    fn model(&self) -> &str {
        &self.name
    }
}

/// Trim surrounding whitespace; blank text counts as no answer.
pub(crate) fn clean_completion_text(text: &str) -> Option<String> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
