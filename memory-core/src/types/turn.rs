use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Role of the speaker that produced a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The assistant/agent.
    Assistant,
    /// System-level instruction or notice.
    System,
}

/// One message in a conversation, held in L1 (`ActiveContextTier`).
///
/// Turns are created on ingest and never mutated; they leave L1 only by
/// window trim or TTL expiry (see §4.1).
///
/// # Examples
///
/// ```
/// use memory_core::types::{Turn, Role};
///
/// let turn = Turn::new("session-1".to_string(), 1, Role::User, "I prefer dark mode".to_string());
/// assert_eq!(turn.turn_id, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Owning session.
    pub session_id: String,
    /// Monotone integer, unique per session.
    pub turn_id: u64,
    /// Who produced the turn.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When the turn was ingested.
    pub timestamp: DateTime<Utc>,
    /// Free-form metadata (e.g. client id, channel).
    pub metadata: HashMap<String, String>,
}

impl Turn {
    /// Construct a turn stamped with the current time and empty metadata.
    #[must_use]
    pub fn new(session_id: String, turn_id: u64, role: Role, content: String) -> Self {
        Self {
            session_id,
            turn_id,
            role,
            content,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Validate the §3 invariants for a `Turn`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `session_id` is empty or
    /// `content` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(Error::ValidationError("turn.session_id must not be empty".into()));
        }
        if self.content.is_empty() {
            return Err(Error::ValidationError("turn.content must not be empty".into()));
        }
        Ok(())
    }
}
