//! Structured logging for the portal assistant
//!
//! Lines go to stderr, away from the chat transcript on stdout, and, once
//! [`init_logging`] has run, to a daily file in the configured log directory. Categories:
//! - FAQ: knowledge base hits and misses
//! - ESCALATION: remote completion attempts and fallbacks
//! - MEMORY: conversation memory writes and evictions
//! - CONVERSATION: request lifecycle and state transitions
//! - ERROR: failures absorbed by the orchestrator

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Faq,
    Escalation,
    Memory,
    Conversation,
    Error,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Faq => "FAQ",
            LogCategory::Escalation => "ESCALATION",
            LogCategory::Memory => "MEMORY",
            LogCategory::Conversation => "CONVERSATION",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Directory for log files; `None` until initialised (console only).
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

fn log_file_path(dir: &Path) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("portal-assistant-{}.log", today))
}

/// Create the log directory and start writing log files there.
pub fn init_logging(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    *LOG_DIR.lock().map_err(|_| "log state poisoned")? = Some(dir.to_path_buf());

    log(LogCategory::Conversation, None, "Portal assistant logging initialized");

    Ok(())
}

pub fn format_line(category: LogCategory, request_id: Option<&str>, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let request_context = request_id
        .map(|id| format!("request={} | ", id.get(..8).unwrap_or(id)))
        .unwrap_or_default();

    format!("[{}] [{}] {}{}\n", timestamp, category.as_str(), request_context, message)
}

/// Log a message with category and optional request context
pub fn log(category: LogCategory, request_id: Option<&str>, message: &str) {
    let log_line = format_line(category, request_id, message);

    let dir = match LOG_DIR.lock() {
        Ok(guard) => guard.clone(),
        Err(_) => None,
    };
    emit(&log_line, &mut std::io::stderr(), dir.as_deref());
}

fn emit(log_line: &str, console: &mut dyn Write, dir: Option<&Path>) {
    let _ = console.write_all(log_line.as_bytes());

    if let Some(dir) = dir {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path(dir))
        {
            let _ = file.write_all(log_line.as_bytes());
        }
    }
}

pub fn log_faq(request_id: Option<&str>, message: &str) {
    log(LogCategory::Faq, request_id, message);
}

pub fn log_escalation(request_id: Option<&str>, message: &str) {
    log(LogCategory::Escalation, request_id, message);
}

pub fn log_memory(request_id: Option<&str>, message: &str) {
    log(LogCategory::Memory, request_id, message);
}

pub fn log_conversation(request_id: Option<&str>, message: &str) {
    log(LogCategory::Conversation, request_id, message);
}

pub fn log_error(request_id: Option<&str>, message: &str) {
    log(LogCategory::Error, request_id, message);
}

/// Delete log files older than `keep_days` from `dir`
pub fn cleanup_old_logs(dir: &Path, keep_days: i64) -> Result<usize, Box<dyn std::error::Error>> {
    let mut deleted = 0;

    if !dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(keep_days);

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("portal-assistant-") && n.ends_with(".log"));
        if !is_log {
            continue;
        }

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            let modified_time: chrono::DateTime<Utc> = modified.into();
            if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
    }

    Ok(deleted)
}
