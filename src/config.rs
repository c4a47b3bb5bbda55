use crate::anthropic::CLAUDE_SONNET;
use crate::openai::{GPT_4O_MINI, OPENAI_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub primary_model: String,
    pub fallback_model: String,
    pub fallback_base_url: String,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub request_timeout_secs: u64,
}

fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".portal-assistant")
}

impl Default for AssistantConfig {
    fn default() -> Self {
        let dir = data_dir();
        Self {
            anthropic_api_key: None,
            openai_api_key: None,
            primary_model: CLAUDE_SONNET.to_string(),
            fallback_model: GPT_4O_MINI.to_string(),
            fallback_base_url: OPENAI_BASE_URL.to_string(),
            db_path: dir.join("memory.db"),
            log_dir: dir.join("logs"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AssistantConfig {
    /// Defaults overridden by `PORTAL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.anthropic_api_key = non_empty("PORTAL_ANTHROPIC_API_KEY");
        config.openai_api_key = non_empty("PORTAL_OPENAI_API_KEY");
        if let Some(model) = non_empty("PORTAL_PRIMARY_MODEL") {
            config.primary_model = model;
        }
        if let Some(model) = non_empty("PORTAL_FALLBACK_MODEL") {
            config.fallback_model = model;
        }
        if let Some(url) = non_empty("PORTAL_FALLBACK_BASE_URL") {
            config.fallback_base_url = url;
        }
        if let Some(path) = non_empty("PORTAL_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty("PORTAL_LOG_DIR") {
            config.log_dir = PathBuf::from(path);
        }
        if let Some(secs) = non_empty("PORTAL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = match secs.parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PORTAL_REQUEST_TIMEOUT_SECS".to_string(),
                        value: secs,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AssistantConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.anthropic_api_key.is_none());
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.primary_model, CLAUDE_SONNET);
        assert_eq!(config.fallback_model, GPT_4O_MINI);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.db_path.ends_with(".portal-assistant/memory.db"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AssistantConfig::from_lookup(lookup(&[
            ("PORTAL_ANTHROPIC_API_KEY", "sk-ant"),
            ("PORTAL_OPENAI_API_KEY", "  "),
            ("PORTAL_FALLBACK_BASE_URL", "http://localhost:11434/v1"),
            ("PORTAL_DB_PATH", "/var/lib/portal/memory.db"),
            ("PORTAL_REQUEST_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-ant"));
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.fallback_base_url, "http://localhost:11434/v1");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/portal/memory.db"));
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        for value in ["abc", "0", "-3"] {
            let err = AssistantConfig::from_lookup(lookup(&[("PORTAL_REQUEST_TIMEOUT_SECS", value)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORTAL_REQUEST_TIMEOUT_SECS"));
        }
    }
}
