//! Terminal stand-ins for the browser speech capabilities
//!
//! A typed line is the utterance. Playback optionally pipes the response to
//! an external text-to-speech command such as `espeak` or `say`.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::oneshot;

use super::capabilities::{SpeechRecognizer, SpeechSynthesizer};
use super::client::{ClientEvent, EventSender, VoiceClient, event_channel};
use super::machine::ClientView;
use super::relay::PromptRelay;
use crate::{Error, Result};

/// Reads one line from stdin per utterance
pub struct ConsoleRecognizer {
    events: EventSender,
    lines: Arc<tokio::sync::Mutex<Lines<BufReader<Stdin>>>>,
}

impl ConsoleRecognizer {
    #[must_use]
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            lines: Arc::new(tokio::sync::Mutex::new(
                BufReader::new(tokio::io::stdin()).lines(),
            )),
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start_listening(&self) -> Result<()> {
        print!("> ");
        std::io::stdout().flush()?;

        let lines = Arc::clone(&self.lines);
        let events = self.events.clone();
        tokio::spawn(async move {
            match lines.lock().await.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    notify(&events, ClientEvent::TranscriptUpdated(line.clone()));
                    notify(&events, ClientEvent::CaptureStopped(line));
                }
                Ok(None) => {
                    notify(&events, ClientEvent::CaptureStopped(String::new()));
                    notify(&events, ClientEvent::Shutdown);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read from stdin");
                    notify(&events, ClientEvent::CaptureStopped(String::new()));
                    notify(&events, ClientEvent::Shutdown);
                }
            }
        });

        Ok(())
    }

    fn stop_listening(&self) -> Result<()> {
        // A line ends when Enter is pressed; there is nothing to cut short
        Ok(())
    }
}

/// Speaks by running an external command with the text as its argument
///
/// Without a command, playback completes instantly.
pub struct CommandSynthesizer {
    program: Option<String>,
    events: EventSender,
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl CommandSynthesizer {
    #[must_use]
    pub const fn new(program: Option<String>, events: EventSender) -> Self {
        Self {
            program,
            events,
            current: Mutex::new(None),
        }
    }

    fn replace_current(&self, next: Option<oneshot::Sender<()>>) {
        let previous = {
            let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        if let Some(cancel) = previous {
            if cancel.send(()).is_err() {
                tracing::debug!("playback already finished");
            }
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&self, text: &str) -> Result<()> {
        let Some(program) = self.program.clone() else {
            self.replace_current(None);
            notify(&self.events, ClientEvent::SpeechStarted);
            notify(&self.events, ClientEvent::SpeechEnded);
            return Ok(());
        };

        let mut child = tokio::process::Command::new(&program)
            .arg(text)
            .stdout(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Speech(format!("failed to run {program}: {e}")))?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.replace_current(Some(cancel_tx));

        let events = self.events.clone();
        tokio::spawn(async move {
            notify(&events, ClientEvent::SpeechStarted);
            tokio::select! {
                status = child.wait() => {
                    if let Err(e) = status {
                        tracing::warn!(error = %e, "speech command failed");
                    }
                    notify(&events, ClientEvent::SpeechEnded);
                }
                _ = cancel_rx => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "failed to stop speech command");
                    }
                }
            }
        });

        Ok(())
    }

    fn cancel(&self) {
        self.replace_current(None);
    }
}

/// Run an interactive console chat against `relay`
///
/// Each typed line is sent as a prompt; Ctrl-D ends the session.
///
/// # Errors
///
/// Returns error if the client task panics
pub async fn run_chat(relay: Arc<dyn PromptRelay>, speak_with: Option<String>) -> Result<()> {
    let (events, receiver) = event_channel();
    let recognizer = Arc::new(ConsoleRecognizer::new(events.clone()));
    let synthesizer = Arc::new(CommandSynthesizer::new(speak_with, events.clone()));
    let client = VoiceClient::new(recognizer, synthesizer, relay, events.clone());

    let mut views = client.subscribe();
    let task = tokio::spawn(client.run(receiver));

    println!("Ask me anything! (Ctrl-D to quit)");

    let mut rearm = Rearm::default();
    let mut last = views.borrow_and_update().clone();
    if rearm.ready(&last) {
        notify(&events, ClientEvent::Start);
    }

    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        render(&last, &view);

        if rearm.ready(&view) {
            notify(&events, ClientEvent::Start);
        }
        last = view;
    }

    task.await
        .map_err(|e| Error::Speech(format!("voice client task failed: {e}")))
}

/// Starts one recording per idle period
///
/// `watch` only keeps the latest snapshot, so a whole listen/load cycle can
/// arrive as a single idle view. Counting recordings catches that.
#[derive(Debug, Default)]
struct Rearm {
    requested: u64,
}

impl Rearm {
    fn ready(&mut self, view: &ClientView) -> bool {
        if view.can_start && view.recordings >= self.requested {
            self.requested = view.recordings + 1;
            true
        } else {
            false
        }
    }
}

fn notify(events: &EventSender, event: ClientEvent) {
    if events.send(event).is_err() {
        tracing::debug!("voice client gone, dropping event");
    }
}

fn render(last: &ClientView, view: &ClientView) {
    if view.is_loading && !last.is_loading {
        println!("Processing...");
    }
    if !view.response_text.is_empty() && view.response_text != last.response_text {
        println!("Response: {}", view.response_text);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::voice::VoiceMachine;

    const WAIT: Duration = Duration::from_secs(2);

    #[test]
    fn rearm_survives_coalesced_cycle() {
        let mut machine = VoiceMachine::new();
        let mut rearm = Rearm::default();
        assert!(rearm.ready(&machine.view()));
        assert!(!rearm.ready(&machine.view()));

        // Listening and loading are never observed, only the idle view after
        machine.start_listening().unwrap();
        machine.capture_stopped("hello".to_string());
        machine.response_received(Err(Error::Relay("unreachable".to_string())));

        assert!(rearm.ready(&machine.view()));
        assert!(!rearm.ready(&machine.view()));
    }

    #[test]
    fn rearm_waits_while_busy() {
        let mut machine = VoiceMachine::new();
        let mut rearm = Rearm::default();
        assert!(rearm.ready(&machine.view()));

        machine.start_listening().unwrap();
        assert!(!rearm.ready(&machine.view()));
    }

    #[tokio::test]
    async fn synthesizer_without_command_finishes_at_once() {
        let (events, mut receiver) = event_channel();
        let synthesizer = CommandSynthesizer::new(None, events);

        synthesizer.speak("hello").unwrap();

        assert!(matches!(receiver.recv().await, Some(ClientEvent::SpeechStarted)));
        assert!(matches!(receiver.recv().await, Some(ClientEvent::SpeechEnded)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn finished_command_reports_speech_ended() {
        let (events, mut receiver) = event_channel();
        let synthesizer = CommandSynthesizer::new(Some("true".to_string()), events);

        synthesizer.speak("hello").unwrap();

        let started = tokio::time::timeout(WAIT, receiver.recv()).await.unwrap();
        assert!(matches!(started, Some(ClientEvent::SpeechStarted)));
        let ended = tokio::time::timeout(WAIT, receiver.recv()).await.unwrap();
        assert!(matches!(ended, Some(ClientEvent::SpeechEnded)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancel_kills_command_without_speech_ended() {
        let (events, mut receiver) = event_channel();
        let synthesizer = CommandSynthesizer::new(Some("sleep".to_string()), events);

        synthesizer.speak("30").unwrap();
        let started = tokio::time::timeout(WAIT, receiver.recv()).await.unwrap();
        assert!(matches!(started, Some(ClientEvent::SpeechStarted)));

        synthesizer.cancel();
        drop(synthesizer);

        // The playback task exits once the child is killed, closing the channel
        let next = tokio::time::timeout(WAIT, receiver.recv())
            .await
            .expect("speech command still running after cancel");
        assert!(next.is_none(), "unexpected event after cancel: {next:?}");
    }

    #[tokio::test]
    async fn missing_command_is_speech_error() {
        let (events, _receiver) = event_channel();
        let synthesizer =
            CommandSynthesizer::new(Some("voice-assistant-no-such-tts".to_string()), events);

        assert!(matches!(synthesizer.speak("hello"), Err(Error::Speech(_))));
    }
}
