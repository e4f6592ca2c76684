use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::BackendConfig;
use crate::models::Message;
use crate::providers::{BackendError, GenerateRequest, GenerationBackend};

/// Assistant-prompt delimiter the backend sometimes echoes ahead of its answer.
pub const DEFAULT_REPLY_MARKER: &str = "Asistente (responde brevemente en una sola oración, sin repetir el prompt y finaliza con un cierre breve):";
pub const ERROR_TEXT: &str = "⚠️ Error obtaining response.";
pub const NO_RESPONSE_TEXT: &str = "No response received.";

/// Result of one generation round trip, already annotated with its latency.
#[derive(Debug)]
pub enum DispatchOutcome {
    Reply {
        text: String,
        reasoning: String,
    },
    Failed {
        error: BackendError,
        reasoning: String,
    },
}

impl DispatchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failed { .. })
    }

    pub fn into_message(self) -> Message {
        match self {
            DispatchOutcome::Reply { text, reasoning } => Message::bot(text, Some(reasoning)),
            DispatchOutcome::Failed { reasoning, .. } => Message::bot(ERROR_TEXT, Some(reasoning)),
        }
    }
}

/// Sends prompts to the backend, one at a time. Clones share the busy flag.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn GenerationBackend>,
    max_tokens: u32,
    reply_marker: String,
    busy: Arc<AtomicBool>,
}

/// Holds the dispatcher's busy flag until dropped.
#[derive(Debug)]
pub struct DispatchPermit(Arc<AtomicBool>);

impl Drop for DispatchPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: &BackendConfig) -> Self {
        Self {
            backend,
            max_tokens: config.max_tokens(),
            reply_marker: config.reply_marker.clone(),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the busy flag. `None` while another call is in flight; the flag
    /// is released when the permit drops.
    pub fn try_begin(&self) -> Option<DispatchPermit> {
        match self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Some(DispatchPermit(Arc::clone(&self.busy))),
            Err(_) => {
                tracing::debug!("Dispatch refused: request already in flight");
                None
            }
        }
    }

    /// Send `prompt` with `history` (which already ends with the prompt's user
    /// message). Returns `None` without contacting the backend while another
    /// call is in flight.
    pub async fn send_prompt(&self, prompt: &str, history: &[Message]) -> Option<DispatchOutcome> {
        let permit = self.try_begin()?;
        Some(self.dispatch(permit, prompt, history).await)
    }

    /// Like [`Dispatcher::send_prompt`], for callers that claimed the flag
    /// up front with [`Dispatcher::try_begin`].
    pub async fn dispatch(
        &self,
        permit: DispatchPermit,
        prompt: &str,
        history: &[Message],
    ) -> DispatchOutcome {
        debug_assert!(Arc::ptr_eq(&permit.0, &self.busy));

        let request = GenerateRequest {
            prompt: prompt.to_string(),
            max_tokens: self.max_tokens,
            history: history.to_vec(),
        };

        let started = Instant::now();
        let result = self.backend.generate(request).await;
        let reasoning = reasoning_label(started.elapsed());

        let outcome = match result {
            Ok(response) => {
                let raw = response
                    .response
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());
                DispatchOutcome::Reply {
                    text: strip_reply_marker(&raw, &self.reply_marker),
                    reasoning,
                }
            }
            Err(error) => {
                tracing::error!("API error: {}", error);
                DispatchOutcome::Failed { error, reasoning }
            }
        };

        drop(permit);
        outcome
    }
}

/// Keep only the text after the first `marker`, trimmed. Text without the
/// marker passes through untouched.
pub fn strip_reply_marker(reply: &str, marker: &str) -> String {
    if marker.is_empty() {
        return reply.to_string();
    }
    match reply.split_once(marker) {
        Some((_, after)) => after.trim().to_string(),
        None => reply.to_string(),
    }
}

pub fn reasoning_label(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64().round() as u64;
    let plural = if secs == 1 { "" } else { "s" };
    format!("Reasoning for {} second{}", secs, plural)
}
