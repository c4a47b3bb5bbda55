pub mod anthropic;
pub mod completion;
pub mod config;
pub mod knowledge;
pub mod logging;
pub mod matcher;
pub mod memory;
pub mod openai;
pub mod orchestrator;
pub mod prompts;

pub use completion::{Completion, CompletionError, CompletionService};
pub use config::{AssistantConfig, ConfigError};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, Partition, Role};
pub use matcher::IntentMatcher;
pub use memory::{ConversationTurn, MemoryError, MemoryStore, UserMemory};
pub use orchestrator::{AssistantReply, ReplyKind, ReplySource, ResponseOrchestrator};

use anthropic::AnthropicClient;
use completion::UnconfiguredService;
use openai::OpenAIClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Log files older than this are removed at startup.
const LOG_RETENTION_DAYS: i64 = 7;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The active user as supplied by the identity provider. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub name: String,
}

impl Identity {
    pub fn new(user_id: &str, role: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: Role::from_str(role),
            name: name.to_string(),
        }
    }
}

/// Entry point used by the chat window.
pub struct Assistant {
    orchestrator: ResponseOrchestrator,
}

impl Assistant {
    pub fn new(
        memory: Arc<MemoryStore>,
        primary: Arc<dyn CompletionService>,
        secondary: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            orchestrator: ResponseOrchestrator::new(memory, primary, secondary),
        }
    }

    /// Open the memory store and build both completion services from `config`.
    ///
    /// A missing API key yields a service that always fails, so the
    /// fallback chain still ends in a reply.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, SetupError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SetupError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let memory = Arc::new(MemoryStore::open(&config.db_path)?);

        let primary: Arc<dyn CompletionService> = match &config.anthropic_api_key {
            Some(key) => Arc::new(AnthropicClient::new(key, &config.primary_model, config.request_timeout())?),
            None => Arc::new(UnconfiguredService::new(&config.primary_model)),
        };
        let secondary: Arc<dyn CompletionService> = match &config.openai_api_key {
            Some(key) => Arc::new(OpenAIClient::new(
                key,
                &config.fallback_base_url,
                &config.fallback_model,
                config.request_timeout(),
            )?),
            None => Arc::new(UnconfiguredService::new(&config.fallback_model)),
        };

        logging::log_conversation(None, &format!(
            "Assistant ready: primary={} fallback={} db={}",
            primary.model(),
            secondary.model(),
            config.db_path.display()
        ));

        Ok(Self::new(memory, primary, secondary))
    }

    pub async fn respond(
        &self,
        message: &str,
        role: Role,
        user_id: &str,
        context: Option<&str>,
        has_image: bool,
    ) -> AssistantReply {
        self.orchestrator.respond(message, role, user_id, context, has_image).await
    }

    pub async fn respond_as(
        &self,
        identity: &Identity,
        message: &str,
        context: Option<&str>,
        has_image: bool,
    ) -> AssistantReply {
        self.respond(message, identity.role, &identity.user_id, context, has_image).await
    }

    pub fn memory(&self, user_id: &str) -> Result<Option<UserMemory>, MemoryError> {
        self.orchestrator.memory().get(user_id)
    }

    pub fn welcome_banner(&self, identity: &Identity) -> String {
        let memory = match self.memory(&identity.user_id) {
            Ok(memory) => memory,
            Err(e) => {
                logging::log_error(None, &format!("Failed to load memory for banner: {}", e));
                None
            }
        };
        prompts::welcome_banner(&identity.name, memory.as_ref())
    }
}

/// Start logging, prune old logs and build the assistant.
pub fn init_app(config: &AssistantConfig) -> Result<Assistant, SetupError> {
    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let _ = logging::cleanup_old_logs(&config.log_dir, LOG_RETENTION_DAYS);

    Assistant::from_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_role_parsing_defaults_to_visitor() {
        assert_eq!(Identity::new("a@x.com", "Student", "A").role, Role::Student);
        assert_eq!(Identity::new("b@x.com", "OFFICIAL", "B").role, Role::Official);
        assert_eq!(Identity::new("c@x.com", "", "C").role, Role::Visitor);
        assert_eq!(Identity::new("d@x.com", "admin", "D").role, Role::Visitor);
    }

    #[tokio::test]
    async fn unconfigured_assistant_still_replies_and_remembers() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig {
            db_path: dir.path().join("nested").join("memory.db"),
            log_dir: dir.path().join("logs"),
            ..AssistantConfig::default()
        };
        let assistant = Assistant::from_config(&config).unwrap();
        let identity = Identity::new("ravi@example.com", "startup", "Ravi");

        assert!(assistant.welcome_banner(&identity).starts_with("Hi Ravi!"));

        let reply = assistant.respond_as(&identity, "post job opening", None, false).await;
        assert_eq!(reply.model, ReplySource::Faq);

        let reply = assistant.respond_as(&identity, "what is sethu", None, false).await;
        assert_eq!(reply.model, ReplySource::ErrorFallback);

        assert_eq!(assistant.memory("ravi@example.com").unwrap().unwrap().conversations.len(), 2);
        assert!(assistant.welcome_banner(&identity).contains("what is sethu"));
    }
}
