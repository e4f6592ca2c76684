use crate::models::{Message, Thread};

use super::persistence::Persistence;

pub const SUMMARY_MAX_CHARS: usize = 20;
pub const PASTE_USER_TEXT: &str = "I copied this text for analysis:";
pub const PASTE_REASONING: &str = "Content pasted as assistant reply";
pub const PASTE_SUMMARY: &str = "Pasted text analysis";

const CONFIRM_CLEAR: &str = "Are you sure you want to delete the whole history?";
const CONFIRM_DELETE: &str = "Are you sure you want to delete this chat?";
const RENAME_PROMPT: &str = "Enter the new chat name:";

/// Blocking user dialogs the store needs for destructive or naming actions.
pub trait Prompter {
    fn confirm(&self, message: &str) -> bool;
    fn prompt(&self, message: &str) -> Option<String>;
}

/// All chat threads plus the active pointer. Every mutation writes through to
/// persistence before returning.
pub struct ConversationStore {
    threads: Vec<Thread>,
    active: usize,
    persistence: Persistence,
    prompter: Box<dyn Prompter>,
}

impl ConversationStore {
    /// Restore from persistence; the last thread becomes active.
    pub fn load(persistence: Persistence, prompter: Box<dyn Prompter>) -> Self {
        let threads = persistence.load();
        let active = threads.len().saturating_sub(1);
        Self {
            threads,
            active,
            persistence,
            prompter,
        }
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_thread(&self) -> &Thread {
        &self.threads[self.active]
    }

    fn active_thread_mut(&mut self) -> &mut Thread {
        &mut self.threads[self.active]
    }

    fn persist(&self) {
        self.persistence.save(&self.threads);
    }

    fn reset(&mut self) {
        self.threads = vec![Thread::fresh()];
        self.active = 0;
    }

    /// Open a new empty thread unless the active one is still empty.
    pub fn new_thread(&mut self) -> bool {
        if self.active_thread().is_empty() {
            return false;
        }
        let thread = Thread::fresh_after(&self.threads);
        self.threads.push(thread);
        self.active = self.threads.len() - 1;
        self.persist();
        true
    }

    pub fn select_thread(&mut self, index: usize) -> bool {
        if index >= self.threads.len() {
            tracing::warn!("Ignoring selection of missing thread {}", index);
            return false;
        }
        self.active = index;
        true
    }

    pub fn clear_all(&mut self) -> bool {
        if !self.prompter.confirm(CONFIRM_CLEAR) {
            return false;
        }
        self.reset();
        self.persist();
        tracing::info!("Cleared chat history");
        true
    }

    pub fn delete_thread(&mut self, index: usize) -> bool {
        if index >= self.threads.len() {
            tracing::warn!("Ignoring delete of missing thread {}", index);
            return false;
        }
        if !self.prompter.confirm(CONFIRM_DELETE) {
            return false;
        }

        self.threads.remove(index);

        let next = if index == self.active {
            0
        } else if index < self.active {
            self.active - 1
        } else {
            self.active
        };

        if self.threads.is_empty() {
            self.reset();
        } else {
            self.active = next.min(self.threads.len() - 1);
        }

        self.persist();
        true
    }

    pub fn rename_thread(&mut self, index: usize) -> bool {
        if index >= self.threads.len() {
            tracing::warn!("Ignoring rename of missing thread {}", index);
            return false;
        }
        let name = match self.prompter.prompt(RENAME_PROMPT) {
            Some(name) if !name.is_empty() => name,
            _ => return false,
        };
        self.threads[index].summary = name;
        self.persist();
        true
    }

    pub fn append_user_message(&mut self, text: &str) {
        let thread = self.active_thread_mut();
        if thread.is_empty() {
            thread.summary = summarize(text);
        }
        thread.messages.push(Message::user(text));
        self.persist();
    }

    pub fn append_bot_message(&mut self, message: Message) {
        self.active_thread_mut().messages.push(message);
        self.persist();
    }

    /// Record clipboard text as if the assistant had produced it.
    pub fn ingest_pasted_content(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let thread = self.active_thread_mut();
        if thread.is_empty() {
            thread.summary = PASTE_SUMMARY.to_string();
        }
        thread.messages.push(Message::user(PASTE_USER_TEXT));
        thread.messages.push(Message::pasted(text, PASTE_REASONING));
        self.persist();
        true
    }
}

/// Derive a thread summary from its first user message.
pub fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((boundary, _)) => format!("{}...", &text[..boundary]),
        None => text.to_string(),
    }
}
