//! Per-user conversation memory.
//!
//! Every tracked message becomes an immutable [`ConversationTurn`] appended to
//! the user's [`UserMemory`]. The history is a sliding window: once it holds
//! more than [`MEMORY_CAP`] turns the oldest ones are evicted. Records are keyed
//! by a stable user identity (email) and live in SQLite, so they survive
//! restarts. There is no update or delete API.

use crate::knowledge::Role;
use crate::logging;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Maximum number of turns retained per user.
pub const MEMORY_CAP: usize = 50;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt JSON column: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Memory store lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub context: Option<String>,
    pub timestamp: String, // RFC 3339, UTC
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserMemory {
    pub user_id: String,
    pub role: Role,
    pub conversations: Vec<ConversationTurn>, // oldest first
    pub preferences: Map<String, Value>,
    pub context: Map<String, Value>,
}

impl UserMemory {
    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.conversations.last()
    }
}

pub struct MemoryStore {
    conn: Mutex<Connection>,
}

impl MemoryStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, MemoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, MemoryError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS user_memory (
                user_id TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                preferences TEXT NOT NULL DEFAULT '{}',
                context TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS conversation_turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                question TEXT NOT NULL,
                context TEXT,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES user_memory(user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_turns_user ON conversation_turns(user_id, id);
            ",
        )?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Append a turn for `user_id`, creating the record with `role` if absent.
    ///
    /// Insert and eviction run in one transaction under the store lock, so a
    /// reader never observes more than [`MEMORY_CAP`] turns.
    pub fn record(
        &self,
        user_id: &str,
        role: Role,
        question: &str,
        context: Option<&str>,
    ) -> Result<(), MemoryError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO user_memory (user_id, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![user_id, role.as_str(), now],
        )?;
        tx.execute(
            "UPDATE user_memory SET updated_at = ?1 WHERE user_id = ?2",
            params![now, user_id],
        )?;
        tx.execute(
            "INSERT INTO conversation_turns (user_id, question, context, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, question, context, now],
        )?;
        let evicted = tx.execute(
            "DELETE FROM conversation_turns
             WHERE user_id = ?1 AND id NOT IN (
                 SELECT id FROM conversation_turns
                 WHERE user_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2
             )",
            params![user_id, MEMORY_CAP as i64],
        )?;

        tx.commit()?;

        if evicted > 0 {
            logging::log_memory(None, &format!(
                "user={} evicted {} oldest turn(s), cap {}",
                user_id, evicted, MEMORY_CAP
            ));
        }

        Ok(())
    }

    /// Read-only snapshot of a user's memory, `None` if never recorded.
    pub fn get(&self, user_id: &str) -> Result<Option<UserMemory>, MemoryError> {
        let conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;

        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT role, preferences, context FROM user_memory WHERE user_id = ?1",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((role, preferences, context)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT question, context, timestamp
             FROM conversation_turns
             WHERE user_id = ?1
             ORDER BY id ASC",
        )?;
        let conversations = stmt
            .query_map([user_id], |row| {
                Ok(ConversationTurn {
                    question: row.get(0)?,
                    context: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(UserMemory {
            user_id: user_id.to_string(),
            role: Role::from_str(&role),
            conversations,
            preferences: serde_json::from_str(&preferences)?,
            context: serde_json::from_str(&context)?,
        }))
    }

    /// The last `limit` questions asked by `user_id`, oldest first.
    pub fn recent_questions(&self, user_id: &str, limit: usize) -> Result<Vec<String>, MemoryError> {
        let conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT question FROM conversation_turns
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let mut questions = stmt
            .query_map(params![user_id, limit as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        questions.reverse();
        Ok(questions)
    }
}
