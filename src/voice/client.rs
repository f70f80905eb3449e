//! Event-driven voice client
//!
//! User commands and capability notifications arrive on one channel and are
//! applied to the `VoiceMachine` in order. Relay requests run in spawned tasks
//! and report back on the same channel, so stop and clear stay responsive
//! while a request is in flight.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::capabilities::{SpeechRecognizer, SpeechSynthesizer};
use super::machine::{ClientView, Effect, VoiceMachine};
use super::relay::PromptRelay;
use crate::Result;

/// Sender half of the client event channel
pub type EventSender = mpsc::UnboundedSender<ClientEvent>;

/// Receiver half of the client event channel
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Input to the voice client
#[derive(Debug)]
pub enum ClientEvent {
    /// User pressed start
    Start,
    /// User ended the recording early
    StopListening,
    /// User pressed stop during playback
    StopSpeaking,
    /// User pressed clear
    Clear,
    /// Recognizer produced an interim transcript
    TranscriptUpdated(String),
    /// Recognizer finished with the final transcript
    CaptureStopped(String),
    /// Synthesizer began playback
    SpeechStarted,
    /// Synthesizer finished playback
    SpeechEnded,
    /// Relay answered the in-flight prompt
    ResponseReceived(Result<String>),
    /// Stop the event loop
    Shutdown,
}

/// Create the event channel shared by the client and its capabilities
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Voice client driving a `VoiceMachine` with injected capabilities
pub struct VoiceClient {
    machine: VoiceMachine,
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    relay: Arc<dyn PromptRelay>,
    events: EventSender,
    view: watch::Sender<ClientView>,
}

impl VoiceClient {
    /// Create a client; `events` must feed the receiver passed to `run`
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        relay: Arc<dyn PromptRelay>,
        events: EventSender,
    ) -> Self {
        let machine = VoiceMachine::new();
        let (view, _) = watch::channel(machine.view());
        Self {
            machine,
            recognizer,
            synthesizer,
            relay,
            events,
            view,
        }
    }

    /// Subscribe to UI snapshots, published after every event
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ClientView> {
        self.view.subscribe()
    }

    /// Current UI snapshot
    #[must_use]
    pub fn view(&self) -> ClientView {
        self.machine.view()
    }

    /// Process events until `Shutdown` or until every sender is gone
    pub async fn run(mut self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            if matches!(event, ClientEvent::Shutdown) {
                break;
            }
            self.handle(event);
        }

        self.synthesizer.cancel();
        tracing::debug!("voice client stopped");
    }

    /// Apply one event and carry out the resulting effects
    ///
    /// Must be called from within a Tokio runtime; relay requests are spawned.
    pub fn handle(&mut self, event: ClientEvent) {
        tracing::trace!(?event, state = %self.machine.state(), "client event");

        let effects = match event {
            ClientEvent::Start => self.command(VoiceMachine::start_listening),
            ClientEvent::StopListening => self.command(VoiceMachine::stop_listening),
            ClientEvent::StopSpeaking => self.command(VoiceMachine::stop_speaking),
            ClientEvent::Clear => self.command(VoiceMachine::clear),
            ClientEvent::TranscriptUpdated(text) => {
                self.machine.transcript_updated(&text);
                Vec::new()
            }
            ClientEvent::CaptureStopped(transcript) => self.machine.capture_stopped(transcript),
            ClientEvent::SpeechStarted | ClientEvent::Shutdown => Vec::new(),
            ClientEvent::SpeechEnded => {
                self.machine.speech_ended();
                Vec::new()
            }
            ClientEvent::ResponseReceived(result) => self.machine.response_received(result),
        };

        for effect in effects {
            self.apply(effect);
        }

        self.view.send_replace(self.machine.view());
    }

    fn command(&mut self, transition: fn(&mut VoiceMachine) -> Result<Vec<Effect>>) -> Vec<Effect> {
        transition(&mut self.machine).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "command ignored");
            Vec::new()
        })
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartCapture => {
                if let Err(e) = self.recognizer.start_listening() {
                    tracing::error!(error = %e, "failed to start speech recognition");
                    self.machine.capture_stopped(String::new());
                }
            }
            Effect::StopCapture => {
                if let Err(e) = self.recognizer.stop_listening() {
                    tracing::warn!(error = %e, "failed to stop speech recognition");
                }
            }
            Effect::SendPrompt(prompt) => {
                let relay = Arc::clone(&self.relay);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = relay.generate(&prompt).await;
                    if events.send(ClientEvent::ResponseReceived(result)).is_err() {
                        tracing::debug!("client gone before relay responded");
                    }
                });
            }
            Effect::Speak(text) => {
                if let Err(e) = self.synthesizer.speak(&text) {
                    tracing::error!(error = %e, "failed to start speech playback");
                    self.machine.speech_ended();
                }
            }
            Effect::CancelSpeech => self.synthesizer.cancel(),
        }
    }
}
