//! Speech-to-text capture with silence detection and auto-submission.
//!
//! [`CaptureController`] is a plain state machine fed with engine events and
//! clock readings. [`run_capture`] drives it on tokio timers for one session.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::SpeechConfig;

/// Shown in the input while a session is open and nothing was recognized yet.
pub const LISTENING_PLACEHOLDER: &str = "Listening...";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech recognition is not available")]
    Unavailable,

    #[error("Failed to start recognition: {0}")]
    StartFailed(String),
}

/// Everything a recognition engine reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Latest full transcript; replaces any earlier one.
    Result(String),
    Error(String),
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub locale: String,
}

/// A recognition engine. Events flow back through the channel handed to
/// [`run_capture`]; `stop` must eventually produce [`SpeechEvent::End`].
pub trait SpeechEngine: Send {
    fn start(&mut self, options: &RecognitionOptions) -> Result<(), SpeechError>;
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening {
        started_at: Instant,
        last_activity: Instant,
    },
    /// Engine asked to stop; waiting for its end event.
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureUpdate {
    Draft(String),
    AutoSend(String),
    Stopped,
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureTimings {
    pub poll_interval: Duration,
    pub silence_timeout: Duration,
    pub max_duration: Duration,
    pub auto_send_delay: Duration,
    /// How long to wait for the engine's end event after asking it to stop.
    pub close_grace: Duration,
}

impl From<&SpeechConfig> for CaptureTimings {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            silence_timeout: Duration::from_millis(config.silence_timeout_ms),
            max_duration: Duration::from_millis(config.max_duration_ms),
            auto_send_delay: Duration::from_millis(config.auto_send_delay_ms),
            close_grace: Duration::from_millis(config.close_grace_ms),
        }
    }
}

pub struct CaptureController<E> {
    engine: E,
    options: RecognitionOptions,
    timings: CaptureTimings,
    state: CaptureState,
    pending: String,
}

impl<E: SpeechEngine> CaptureController<E> {
    pub fn new(engine: E, config: &SpeechConfig) -> Self {
        Self {
            engine,
            options: RecognitionOptions {
                continuous: true,
                interim_results: false,
                locale: config.locale.clone(),
            },
            timings: CaptureTimings::from(config),
            state: CaptureState::Idle,
            pending: String::new(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn timings(&self) -> CaptureTimings {
        self.timings
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, CaptureState::Listening { .. })
    }

    pub fn pending_text(&self) -> &str {
        &self.pending
    }

    /// Open a session. Returns `Ok(false)` if one is already open.
    pub fn start(&mut self, now: Instant) -> Result<bool, SpeechError> {
        if self.state != CaptureState::Idle {
            return Ok(false);
        }
        self.engine.start(&self.options)?;
        self.pending = LISTENING_PLACEHOLDER.to_string();
        self.state = CaptureState::Listening {
            started_at: now,
            last_activity: now,
        };
        tracing::debug!("Speech capture started ({})", self.options.locale);
        Ok(true)
    }

    /// User-initiated stop. Auto-send can still happen on the end event.
    pub fn stop(&mut self) {
        if self.is_listening() {
            tracing::debug!("Speech capture stopped by user");
            self.close();
        }
    }

    fn close(&mut self) {
        self.engine.stop();
        self.state = CaptureState::Closing;
    }

    /// Silence check; returns true if it stopped the engine.
    pub fn poll(&mut self, now: Instant) -> bool {
        let CaptureState::Listening { last_activity, .. } = self.state else {
            return false;
        };
        if now.duration_since(last_activity) > self.timings.silence_timeout {
            tracing::debug!("Speech capture stopped after silence");
            self.close();
            return true;
        }
        false
    }

    /// Hard ceiling check; returns true if it stopped the engine.
    pub fn expire(&mut self, now: Instant) -> bool {
        let CaptureState::Listening { started_at, .. } = self.state else {
            return false;
        };
        if now.duration_since(started_at) >= self.timings.max_duration {
            tracing::debug!("Speech capture reached maximum duration");
            self.close();
            return true;
        }
        false
    }

    pub fn handle_event(&mut self, event: SpeechEvent, now: Instant) -> Option<CaptureUpdate> {
        match (event, self.state) {
            (_, CaptureState::Idle) => None,
            (SpeechEvent::Result(transcript), state) => {
                if let CaptureState::Listening { started_at, .. } = state {
                    self.state = CaptureState::Listening {
                        started_at,
                        last_activity: now,
                    };
                }
                self.pending = transcript.clone();
                Some(CaptureUpdate::Draft(transcript))
            }
            (SpeechEvent::Error(code), _) => {
                tracing::error!("Voice recognition error: {}", code);
                self.state = CaptureState::Idle;
                Some(CaptureUpdate::Failed(code))
            }
            (SpeechEvent::End, _) => Some(self.finish()),
        }
    }

    /// Give up on an engine that was asked to stop but never reported the
    /// end. Settles the session as if the end event had arrived.
    pub fn abandon(&mut self) -> Option<CaptureUpdate> {
        if self.state != CaptureState::Closing {
            return None;
        }
        tracing::warn!("Speech engine did not end the session; closing it");
        Some(self.finish())
    }

    fn finish(&mut self) -> CaptureUpdate {
        self.state = CaptureState::Idle;
        let text = std::mem::take(&mut self.pending);
        if text.is_empty() || text == LISTENING_PLACEHOLDER {
            CaptureUpdate::Stopped
        } else {
            CaptureUpdate::AutoSend(text)
        }
    }
}

/// Run one capture session to completion.
///
/// `on_draft` sees the placeholder and every transcript as it arrives. The
/// returned update is terminal: `AutoSend`, `Stopped` or `Failed`. Returns
/// `Stopped` immediately if a session was already open.
pub async fn run_capture<E, F>(
    controller: &mut CaptureController<E>,
    events: &mut mpsc::Receiver<SpeechEvent>,
    stop: CancellationToken,
    mut on_draft: F,
) -> Result<CaptureUpdate, SpeechError>
where
    E: SpeechEngine,
    F: FnMut(&str),
{
    let started = Instant::now();
    if !controller.start(started)? {
        return Ok(CaptureUpdate::Stopped);
    }
    on_draft(controller.pending_text());

    let timings = controller.timings();
    let mut poll = tokio::time::interval(timings.poll_interval);
    let ceiling = tokio::time::sleep_until(started + timings.max_duration);
    tokio::pin!(ceiling);
    // Armed once, when the controller first enters `Closing`.
    let close_deadline = tokio::time::sleep_until(started + timings.max_duration);
    tokio::pin!(close_deadline);
    let mut closing = false;
    let mut stop_requested = false;

    let end = loop {
        tokio::select! {
            _ = stop.cancelled(), if !stop_requested => {
                stop_requested = true;
                controller.stop();
            }
            _ = poll.tick() => {
                controller.poll(Instant::now());
            }
            _ = &mut ceiling, if controller.is_listening() => {
                controller.expire(Instant::now());
            }
            _ = &mut close_deadline, if closing => {
                break controller.abandon().unwrap_or(CaptureUpdate::Stopped);
            }
            event = events.recv() => {
                // A dropped engine counts as a closed session.
                let event = event.unwrap_or(SpeechEvent::End);
                let closed = !matches!(event, SpeechEvent::Result(_));
                match controller.handle_event(event, Instant::now()) {
                    Some(CaptureUpdate::Draft(text)) => on_draft(&text),
                    Some(terminal) => break terminal,
                    None if closed => break CaptureUpdate::Stopped,
                    None => {}
                }
            }
        }

        if !closing && controller.state() == CaptureState::Closing {
            closing = true;
            close_deadline
                .as_mut()
                .reset(Instant::now() + timings.close_grace);
        }
    };

    if matches!(end, CaptureUpdate::AutoSend(_)) {
        tokio::time::sleep(timings.auto_send_delay).await;
    }
    Ok(end)
}
