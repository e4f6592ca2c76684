use crate::models::Thread;

use super::storage::Storage;

/// Storage key holding the serialized thread collection.
pub const HISTORY_KEY: &str = "chatHistories";

/// Best-effort load/save of the whole thread collection as one JSON blob.
pub struct Persistence {
    storage: Box<dyn Storage>,
}

impl Persistence {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Never fails: anything unreadable falls back to one fresh empty thread.
    pub fn load(&self) -> Vec<Thread> {
        let raw = match self.storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![Thread::fresh()],
            Err(e) => {
                tracing::error!("Failed to read chat history: {:#}", e);
                return vec![Thread::fresh()];
            }
        };

        match serde_json::from_str::<Vec<Thread>>(&raw) {
            Ok(threads) if !threads.is_empty() => {
                tracing::debug!("Loaded {} chat threads", threads.len());
                threads
            }
            Ok(_) => vec![Thread::fresh()],
            Err(e) => {
                tracing::error!("Error parsing chat history: {}", e);
                vec![Thread::fresh()]
            }
        }
    }

    pub fn save(&self, threads: &[Thread]) {
        let json = match serde_json::to_string(threads) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize chat history: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(HISTORY_KEY, &json) {
            tracing::error!("Failed to save chat history: {:#}", e);
        }
    }
}
