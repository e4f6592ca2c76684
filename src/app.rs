use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::services::speech::{self, CaptureController, CaptureUpdate, SpeechError, SpeechEngine, SpeechEvent};
use crate::services::{Clipboard, ConversationStore, Dispatcher};

pub const LOADING_STEPS: [&str; 4] = [
    "Analyzing request...",
    "Processing information...",
    "Generating response...",
    "Refining content...",
];

/// Label for the loading indicator, advancing once per second.
pub fn loading_label(elapsed: Duration) -> &'static str {
    LOADING_STEPS[(elapsed.as_secs() as usize) % LOADING_STEPS.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank draft; nothing appended, nothing sent.
    Rejected,
    /// A request is already in flight.
    Busy,
    Replied,
    Failed,
}

/// User intents a front end forwards into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMsg {
    SetInput(String),
    SendMessage,
    NewChat,
    SelectChat(usize),
    DeleteChat(usize),
    RenameChat(usize),
    ClearHistory,
    /// Copy the text of a message in the active thread.
    CopyMessage(usize),
    TogglePasteCapture,
    Paste { text: String, input_focused: bool },
}

/// Front-end independent application state: the store, the dispatcher, the
/// clipboard, the input draft and the paste-capture toggle.
pub struct App {
    store: ConversationStore,
    dispatcher: Dispatcher,
    clipboard: Box<dyn Clipboard>,
    input_text: String,
    paste_capture: bool,
}

impl App {
    pub fn new(
        store: ConversationStore,
        dispatcher: Dispatcher,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clipboard,
            input_text: String::new(),
            paste_capture: false,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn is_loading(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn paste_capture(&self) -> bool {
        self.paste_capture
    }

    pub async fn update(&mut self, msg: AppMsg) -> Option<SendOutcome> {
        match msg {
            AppMsg::SetInput(text) => self.input_text = text,
            AppMsg::SendMessage => return Some(self.send_message().await),
            AppMsg::NewChat => {
                self.store.new_thread();
            }
            AppMsg::SelectChat(index) => {
                self.store.select_thread(index);
            }
            AppMsg::DeleteChat(index) => {
                self.store.delete_thread(index);
            }
            AppMsg::RenameChat(index) => {
                self.store.rename_thread(index);
            }
            AppMsg::ClearHistory => {
                self.store.clear_all();
            }
            AppMsg::CopyMessage(index) => {
                self.copy_message(index);
            }
            AppMsg::TogglePasteCapture => self.toggle_paste_capture(),
            AppMsg::Paste {
                text,
                input_focused,
            } => {
                self.handle_paste(&text, input_focused);
            }
        }
        None
    }

    pub async fn send_message(&mut self) -> SendOutcome {
        if self.input_text.trim().is_empty() {
            return SendOutcome::Rejected;
        }
        // A refused send leaves the draft and the history untouched.
        let Some(permit) = self.dispatcher.try_begin() else {
            return SendOutcome::Busy;
        };

        let text = std::mem::take(&mut self.input_text);
        self.store.append_user_message(&text);
        let history = self.store.active_thread().messages.clone();

        let outcome = self.dispatcher.dispatch(permit, &text, &history).await;
        let failed = outcome.is_failure();
        self.store.append_bot_message(outcome.into_message());
        if failed {
            SendOutcome::Failed
        } else {
            SendOutcome::Replied
        }
    }

    /// Copy message `index` of the active thread. Failures are logged, never
    /// surfaced.
    pub fn copy_message(&self, index: usize) -> bool {
        let Some(message) = self.store.active_thread().messages.get(index) else {
            tracing::debug!("No message {} to copy", index);
            return false;
        };
        match self.clipboard.write_text(&message.text) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error copying text: {:#}", e);
                false
            }
        }
    }

    pub fn toggle_paste_capture(&mut self) {
        self.paste_capture = !self.paste_capture;
        tracing::debug!("Paste capture {}", if self.paste_capture { "on" } else { "off" });
    }

    /// Returns true when the paste was consumed as a synthetic bot reply.
    pub fn handle_paste(&mut self, text: &str, input_focused: bool) -> bool {
        if !self.paste_capture || !input_focused {
            return false;
        }
        if !self.store.ingest_pasted_content(text) {
            return false;
        }
        self.input_text.clear();
        self.paste_capture = false;
        true
    }

    /// Run a speech capture session, mirroring drafts into the input and
    /// sending the final transcript when the session auto-submits.
    pub async fn capture_speech<E: SpeechEngine>(
        &mut self,
        controller: &mut CaptureController<E>,
        events: &mut mpsc::Receiver<SpeechEvent>,
        stop: CancellationToken,
    ) -> Result<Option<SendOutcome>, SpeechError> {
        let input = &mut self.input_text;
        let end = speech::run_capture(controller, events, stop, |draft| {
            *input = draft.to_string();
        })
        .await?;

        match end {
            CaptureUpdate::AutoSend(text) => {
                self.input_text = text;
                Ok(Some(self.send_message().await))
            }
            CaptureUpdate::Failed(_) | CaptureUpdate::Stopped => {
                if self.input_text == speech::LISTENING_PLACEHOLDER {
                    self.input_text.clear();
                }
                Ok(None)
            }
            CaptureUpdate::Draft(_) => Ok(None),
        }
    }
}
