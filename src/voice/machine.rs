//! Voice client state machine
//!
//! Transitions are synchronous and perform no IO. Each accepted transition
//! returns the effects the driver must carry out against the platform
//! capabilities and the relay.

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// Text shown when a request cycle fails
pub const FALLBACK_MESSAGE: &str = "Sorry, something went wrong.";

/// State of the voice client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientState {
    /// Waiting for the user to start recording
    #[default]
    Idle,
    /// Capturing an utterance
    Listening,
    /// Prompt sent to the relay, awaiting its response
    Loading,
    /// Playing back the response
    Speaking,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Loading => "loading",
            Self::Speaking => "speaking",
        })
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin microphone capture
    StartCapture,
    /// End microphone capture early
    StopCapture,
    /// Send the transcript to the relay
    SendPrompt(String),
    /// Speak the response text
    Speak(String),
    /// Cancel any in-progress playback
    CancelSpeech,
}

/// Snapshot of what the UI should render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientView {
    pub state: ClientState,
    pub transcript: String,
    pub response_text: String,
    /// Start control enabled
    pub can_start: bool,
    /// Stop control visible
    pub show_stop: bool,
    /// Clear control visible
    pub show_clear: bool,
    /// Loading indicator on
    pub is_loading: bool,
    pub start_label: &'static str,
    /// Recordings started so far
    pub recordings: u64,
}

/// Voice client state and transcript/response buffers
#[derive(Debug, Default)]
pub struct VoiceMachine {
    state: ClientState,
    transcript: String,
    response_text: String,
    /// Current capture was cleared; its final transcript is dropped
    discard_capture: bool,
    recordings: u64,
}

impl VoiceMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> ClientState {
        self.state
    }

    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    #[must_use]
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    /// Start a new recording, clearing the previous response first
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless idle
    pub fn start_listening(&mut self) -> Result<Vec<Effect>> {
        self.require("start listening", ClientState::Idle)?;

        self.response_text.clear();
        self.transcript.clear();
        self.discard_capture = false;
        self.recordings += 1;
        self.state = ClientState::Listening;
        Ok(vec![Effect::StartCapture])
    }

    /// Ask the recognizer to finish the current utterance
    ///
    /// The state stays `Listening` until the recognizer reports the capture
    /// has stopped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless listening
    pub fn stop_listening(&mut self) -> Result<Vec<Effect>> {
        self.require("stop listening", ClientState::Listening)?;
        Ok(vec![Effect::StopCapture])
    }

    /// Record an interim transcript while listening
    pub fn transcript_updated(&mut self, text: &str) {
        if self.state == ClientState::Listening && !self.discard_capture {
            text.clone_into(&mut self.transcript);
        }
    }

    /// Capture ended with `transcript` as the final text
    ///
    /// A non-empty transcript is sent to the relay; an empty or cleared one
    /// returns to idle.
    pub fn capture_stopped(&mut self, transcript: String) -> Vec<Effect> {
        if self.state != ClientState::Listening {
            tracing::debug!(state = %self.state, "ignoring capture stop");
            return Vec::new();
        }

        if std::mem::take(&mut self.discard_capture) {
            tracing::debug!("dropping cleared capture");
            self.state = ClientState::Idle;
            return Vec::new();
        }

        self.transcript = transcript;
        if self.transcript.is_empty() {
            self.state = ClientState::Idle;
            return Vec::new();
        }

        self.state = ClientState::Loading;
        vec![Effect::SendPrompt(self.transcript.clone())]
    }

    /// Apply the relay's answer for the in-flight prompt
    ///
    /// Success stores the text and starts playback. Failure stores the
    /// fallback message without playback. Either way the transcript is cleared
    /// and loading ends.
    pub fn response_received(&mut self, result: Result<String>) -> Vec<Effect> {
        if self.state != ClientState::Loading {
            tracing::warn!(state = %self.state, "dropping response outside loading state");
            return Vec::new();
        }

        self.transcript.clear();
        match result {
            Ok(text) if text.is_empty() => {
                self.response_text.clear();
                self.state = ClientState::Idle;
                Vec::new()
            }
            Ok(text) => {
                self.response_text.clone_from(&text);
                self.state = ClientState::Speaking;
                vec![Effect::Speak(text)]
            }
            Err(e) => {
                tracing::warn!(error = %e, "request cycle failed");
                FALLBACK_MESSAGE.clone_into(&mut self.response_text);
                self.state = ClientState::Idle;
                Vec::new()
            }
        }
    }

    /// Playback finished (or could not start)
    pub fn speech_ended(&mut self) {
        if self.state == ClientState::Speaking {
            self.state = ClientState::Idle;
        }
    }

    /// Halt playback immediately, keeping the response text
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless speaking
    pub fn stop_speaking(&mut self) -> Result<Vec<Effect>> {
        self.require("stop speaking", ClientState::Speaking)?;

        self.state = ClientState::Idle;
        Ok(vec![Effect::CancelSpeech])
    }

    /// Clear response text and transcript
    ///
    /// Does not abort an in-flight request; its result still lands. While
    /// listening, the capture is stopped and nothing is sent for it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while speaking
    pub fn clear(&mut self) -> Result<Vec<Effect>> {
        if self.state == ClientState::Speaking {
            return Err(Error::InvalidTransition {
                action: "clear",
                state: self.state,
            });
        }

        self.response_text.clear();
        self.transcript.clear();
        if self.state == ClientState::Listening {
            self.discard_capture = true;
            return Ok(vec![Effect::StopCapture]);
        }
        Ok(vec![Effect::CancelSpeech])
    }

    /// Derive the UI snapshot
    #[must_use]
    pub fn view(&self) -> ClientView {
        let speaking = self.state == ClientState::Speaking;
        ClientView {
            state: self.state,
            transcript: self.transcript.clone(),
            response_text: self.response_text.clone(),
            can_start: self.state == ClientState::Idle,
            show_stop: speaking,
            show_clear: !speaking && (!self.response_text.is_empty() || !self.transcript.is_empty()),
            is_loading: self.state == ClientState::Loading,
            start_label: if self.state == ClientState::Listening {
                "Listening..."
            } else {
                "Start Recording"
            },
            recordings: self.recordings,
        }
    }

    fn require(&self, action: &'static str, expected: ClientState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}
