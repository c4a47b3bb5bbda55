use crate::completion::{Completion, CompletionError, CompletionService};
use crate::knowledge::{KnowledgeBase, Role};
use crate::logging;
use crate::matcher::{IntentMatcher, MatchKind};
use crate::memory::MemoryStore;
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const FAQ_MODEL: &str = "FAQ Database";
pub const ERROR_FALLBACK_MODEL: &str = "error-fallback";

pub const APOLOGY: &str = "I'm sorry, I'm having trouble answering that right now. Please try again in a little while, or reach the support team from the Help section if it keeps happening.";

// ============ Reply ============

/// Where a reply came from. Serialized as the plain provenance string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ReplySource {
    Faq,
    Remote(String),
    ErrorFallback,
}

impl ReplySource {
    pub fn as_str(&self) -> &str {
        match self {
            ReplySource::Faq => FAQ_MODEL,
            ReplySource::Remote(model) => model,
            ReplySource::ErrorFallback => ERROR_FALLBACK_MODEL,
        }
    }
}

impl From<ReplySource> for String {
    fn from(source: ReplySource) -> String {
        source.as_str().to_string()
    }
}

impl From<String> for ReplySource {
    fn from(s: String) -> Self {
        match s.as_str() {
            FAQ_MODEL => ReplySource::Faq,
            ERROR_FALLBACK_MODEL => ReplySource::ErrorFallback,
            _ => ReplySource::Remote(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub content: String,
    pub model: ReplySource,
}

impl AssistantReply {
    pub fn faq(answer: &str) -> Self {
        Self { kind: ReplyKind::Text, content: answer.to_string(), model: ReplySource::Faq }
    }

    pub fn remote(completion: Completion) -> Self {
        Self {
            kind: ReplyKind::Text,
            content: completion.content,
            model: ReplySource::Remote(completion.model),
        }
    }

    pub fn apology() -> Self {
        Self { kind: ReplyKind::Text, content: APOLOGY.to_string(), model: ReplySource::ErrorFallback }
    }
}

// ============ State machine ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Received,
    MatchingFaq,
    Escalating,
    Resolved,
    Failed,
    Replied,
}

impl ResponseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseState::Received => "RECEIVED",
            ResponseState::MatchingFaq => "MATCHING_FAQ",
            ResponseState::Escalating => "ESCALATING",
            ResponseState::Resolved => "RESOLVED",
            ResponseState::Failed => "FAILED",
            ResponseState::Replied => "REPLIED",
        }
    }
}

/// Both remote services failed for one message.
#[derive(Error, Debug)]
#[error("primary failed: {primary}; fallback failed: {secondary}")]
pub struct EscalationError {
    pub primary: CompletionError,
    pub secondary: CompletionError,
}

pub struct ResponseOrchestrator {
    knowledge: Arc<KnowledgeBase>,
    memory: Arc<MemoryStore>,
    primary: Arc<dyn CompletionService>,
    secondary: Arc<dyn CompletionService>,
}

impl ResponseOrchestrator {
    pub fn new(
        memory: Arc<MemoryStore>,
        primary: Arc<dyn CompletionService>,
        secondary: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            knowledge: KnowledgeBase::shared(),
            memory,
            primary,
            secondary,
        }
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = Arc::new(knowledge);
        self
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Answer one message. Always produces a reply; failures degrade to the apology.
    ///
    /// The memory turn is written before any matching or network I/O, so the
    /// question is remembered even if the reply is never delivered.
    pub async fn respond(
        &self,
        message: &str,
        role: Role,
        user_id: &str,
        context: Option<&str>,
        has_image: bool,
    ) -> AssistantReply {
        let request_id = Uuid::new_v4().to_string();
        let rid = Some(request_id.as_str());

        transition(rid, ResponseState::Received, &format!(
            "user={} role={} image={} message={}",
            user_id, role.as_str(), has_image, preview(message)
        ));

        if let Err(e) = self.memory.record(user_id, role, message, context) {
            logging::log_error(rid, &format!("Failed to record memory turn: {}", e));
        }

        transition(rid, ResponseState::MatchingFaq, "");
        let matcher = IntentMatcher::new(&self.knowledge);
        if let Some(hit) = matcher.find(message, role) {
            let how = match hit.kind {
                MatchKind::Exact => "exact".to_string(),
                MatchKind::Fuzzy { score } => format!("fuzzy score={}", score),
            };
            logging::log_faq(rid, &format!("Matched key \"{}\" ({})", hit.entry.key, how));
            transition(rid, ResponseState::Resolved, FAQ_MODEL);
            return replied(rid, AssistantReply::faq(hit.entry.answer));
        }
        logging::log_faq(rid, "No knowledge base match");

        transition(rid, ResponseState::Escalating, self.primary.model());
        let memory = match self.memory.get(user_id) {
            Ok(memory) => memory,
            Err(e) => {
                logging::log_error(rid, &format!("Failed to read memory for prompt: {}", e));
                None
            }
        };
        let system_prompt = prompts::build_system_prompt(message, role, context, has_image, memory.as_ref());

        match self.escalate(rid, &system_prompt, message).await {
            Ok(completion) => {
                transition(rid, ResponseState::Resolved, &completion.model);
                replied(rid, AssistantReply::remote(completion))
            }
            Err(e) => {
                logging::log_error(rid, &format!("All completion services failed: {}", e));
                transition(rid, ResponseState::Failed, ERROR_FALLBACK_MODEL);
                replied(rid, AssistantReply::apology())
            }
        }
    }

    /// Primary service, then exactly one attempt on the secondary.
    async fn escalate(
        &self,
        rid: Option<&str>,
        system_prompt: &str,
        message: &str,
    ) -> Result<Completion, EscalationError> {
        let primary = match self.primary.complete(system_prompt, message).await {
            Ok(completion) => return Ok(completion),
            Err(e) => e,
        };

        logging::log_escalation(rid, &format!(
            "Primary {} failed: {}. Falling back to {}",
            self.primary.model(), primary, self.secondary.model()
        ));

        self.secondary
            .complete(system_prompt, message)
            .await
            .map_err(|secondary| EscalationError { primary, secondary })
    }
}

fn transition(rid: Option<&str>, state: ResponseState, detail: &str) {
    if detail.is_empty() {
        logging::log_conversation(rid, &format!("-> {}", state.as_str()));
    } else {
        logging::log_conversation(rid, &format!("-> {} ({})", state.as_str(), detail));
    }
}

fn replied(rid: Option<&str>, reply: AssistantReply) -> AssistantReply {
    transition(rid, ResponseState::Replied, reply.model.as_str());
    reply
}

fn preview(message: &str) -> String {
    let mut preview: String = message.chars().take(80).collect();
    if message.chars().count() > 80 {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeEntry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    enum Behaviour {
        Succeed(&'static str),
        Fail,
        Hang,
    }

    struct ScriptedService {
        model: &'static str,
        behaviour: Behaviour,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn new(model: &'static str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                model,
                behaviour,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedService {
        async fn complete(&self, system_prompt: &str, _user_message: &str) -> Result<Completion, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(system_prompt.to_string());
            match self.behaviour {
                Behaviour::Succeed(text) => Ok(Completion {
                    content: text.to_string(),
                    model: self.model.to_string(),
                }),
                Behaviour::Fail => Err(CompletionError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
                Behaviour::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }

        fn model(&self) -> &str {
            self.model
        }
    }

    fn orchestrator(
        primary: &Arc<ScriptedService>,
        secondary: &Arc<ScriptedService>,
    ) -> ResponseOrchestrator {
        let memory = Arc::new(MemoryStore::open_in_memory().unwrap());
        ResponseOrchestrator::new(memory, primary.clone(), secondary.clone())
    }

    #[tokio::test]
    async fn faq_hit_never_contacts_remote_services() {
        let primary = ScriptedService::new("claude", Behaviour::Succeed("remote"));
        let secondary = ScriptedService::new("gpt", Behaviour::Succeed("remote"));
        let orch = orchestrator(&primary, &secondary);

        let reply = orch
            .respond("how do I apply for job internship", Role::Student, "asha@example.com", None, false)
            .await;

        assert_eq!(reply.model, ReplySource::Faq);
        assert_eq!(reply.kind, ReplyKind::Text);
        assert!(reply.content.contains("Apply Now"));
        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn miss_escalates_to_primary() {
        let primary = ScriptedService::new("claude-sonnet", Behaviour::Succeed("Sethu is a bridge."));
        let secondary = ScriptedService::new("gpt", Behaviour::Succeed("fallback"));
        let orch = orchestrator(&primary, &secondary);

        let reply = orch.respond("what is sethu", Role::Student, "u1", None, false).await;

        assert_eq!(reply.content, "Sethu is a bridge.");
        assert_eq!(reply.model, ReplySource::Remote("claude-sonnet".to_string()));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_with_same_prompt() {
        let primary = ScriptedService::new("claude", Behaviour::Fail);
        let secondary = ScriptedService::new("gpt-4o-mini", Behaviour::Succeed("from fallback"));
        let orch = orchestrator(&primary, &secondary);

        let reply = orch
            .respond("what is sethu", Role::Official, "off@gov.example", Some("Reports page"), true)
            .await;

        assert_eq!(reply.content, "from fallback");
        assert_eq!(reply.model.as_str(), "gpt-4o-mini");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);

        let primary_prompt = primary.prompts.lock().unwrap()[0].clone();
        let secondary_prompt = secondary.prompts.lock().unwrap()[0].clone();
        assert_eq!(primary_prompt, secondary_prompt);
        assert!(primary_prompt.contains("OFFICIAL"));
        assert!(primary_prompt.contains("Reports page"));
        assert!(primary_prompt.contains(prompts::IMAGE_NOTICE));
    }

    #[tokio::test]
    async fn total_failure_replies_with_apology_and_keeps_memory() {
        let primary = ScriptedService::new("claude", Behaviour::Fail);
        let secondary = ScriptedService::new("gpt", Behaviour::Fail);
        let orch = orchestrator(&primary, &secondary);

        let reply = orch.respond("what is sethu", Role::Startup, "founder@x.io", None, false).await;

        assert_eq!(reply, AssistantReply::apology());
        assert_eq!(reply.model.as_str(), "error-fallback");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);

        let memory = orch.memory().get("founder@x.io").unwrap().unwrap();
        assert_eq!(memory.conversations.len(), 1);
        assert_eq!(memory.conversations[0].question, "what is sethu");
    }

    #[tokio::test]
    async fn memory_is_written_before_network_resolves() {
        let primary = ScriptedService::new("claude", Behaviour::Hang);
        let secondary = ScriptedService::new("gpt", Behaviour::Succeed("unused"));
        let orch = orchestrator(&primary, &secondary);

        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            orch.respond("what is sethu", Role::Student, "u1", Some("home"), false),
        )
        .await;
        assert!(pending.is_err());

        let memory = orch.memory().get("u1").unwrap().unwrap();
        assert_eq!(memory.conversations.len(), 1);
        assert_eq!(memory.conversations[0].context.as_deref(), Some("home"));
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn empty_message_is_recorded_and_escalated() {
        let primary = ScriptedService::new("claude", Behaviour::Fail);
        let secondary = ScriptedService::new("gpt", Behaviour::Fail);
        let orch = orchestrator(&primary, &secondary);

        let reply = orch.respond("   ", Role::Visitor, "guest", None, false).await;

        assert_eq!(reply.model, ReplySource::ErrorFallback);
        assert_eq!(primary.calls(), 1);
        assert_eq!(orch.memory().get("guest").unwrap().unwrap().conversations.len(), 1);
    }

    #[tokio::test]
    async fn returning_user_prompt_mentions_earlier_questions() {
        let primary = ScriptedService::new("claude", Behaviour::Succeed("ok"));
        let secondary = ScriptedService::new("gpt", Behaviour::Succeed("ok"));
        let orch = orchestrator(&primary, &secondary);

        orch.respond("find scholarship", Role::Student, "u1", None, false).await;
        orch.respond("what is sethu", Role::Student, "u1", None, false).await;

        let prompt = primary.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("returning user"));
        assert!(prompt.contains("- find scholarship"));
    }

    #[tokio::test]
    async fn custom_knowledge_base_role_precedence() {
        let primary = ScriptedService::new("claude", Behaviour::Fail);
        let secondary = ScriptedService::new("gpt", Behaviour::Fail);
        let kb = KnowledgeBase::from_partitions(
            vec![KnowledgeEntry { key: "office hours", answer: "general" }],
            vec![],
            vec![KnowledgeEntry { key: "office hours", answer: "startup" }],
            vec![],
        );
        let orch = orchestrator(&primary, &secondary).with_knowledge(kb);

        let reply = orch.respond("Office hours?", Role::Startup, "u1", None, false).await;
        assert_eq!(reply.content, "startup");
        let reply = orch.respond("Office hours?", Role::Student, "u2", None, false).await;
        assert_eq!(reply.content, "general");
    }

    #[test]
    fn orchestrators_share_builtin_knowledge() {
        let primary = ScriptedService::new("claude", Behaviour::Fail);
        let secondary = ScriptedService::new("gpt", Behaviour::Fail);
        let first = orchestrator(&primary, &secondary);
        let second = orchestrator(&primary, &secondary);
        assert!(Arc::ptr_eq(&first.knowledge, &second.knowledge));

        let custom = orchestrator(&primary, &secondary).with_knowledge(KnowledgeBase::default());
        assert!(!Arc::ptr_eq(&first.knowledge, &custom.knowledge));
    }

    #[test]
    fn reply_serializes_with_provenance_string() {
        let json = serde_json::to_value(AssistantReply::faq("Hello")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "content": "Hello", "model": "FAQ Database"}));

        let parsed: AssistantReply =
            serde_json::from_str(r#"{"type":"text","content":"x","model":"gpt-4o"}"#).unwrap();
        assert_eq!(parsed.model, ReplySource::Remote("gpt-4o".to_string()));
        let parsed: AssistantReply =
            serde_json::from_str(r#"{"type":"text","content":"x","model":"error-fallback"}"#).unwrap();
        assert_eq!(parsed.model, ReplySource::ErrorFallback);
    }

    #[test]
    fn preview_truncates_long_messages() {
        assert_eq!(preview("short"), "short");
        let long = "a".repeat(100);
        assert_eq!(preview(&long).len(), 83);
    }
}
