use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::message::Message;

/// One independent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Creation time in Unix milliseconds.
    pub id: i64,
    pub summary: String,
    pub messages: Vec<Message>,
}

impl Thread {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            summary: String::new(),
            messages: Vec::new(),
        }
    }

    /// A fresh empty thread stamped with the current time.
    pub fn fresh() -> Self {
        Self::new(Utc::now().timestamp_millis())
    }

    /// A fresh thread whose id is guaranteed not to collide with `existing`.
    pub fn fresh_after(existing: &[Thread]) -> Self {
        let now = Utc::now().timestamp_millis();
        let id = match existing.iter().map(|t| t.id).max() {
            Some(max) if now <= max => max + 1,
            _ => now,
        };
        Self::new(id)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
