//! Platform speech capabilities
//!
//! Recognition and synthesis are provided by the host (a browser, an OS
//! speech API, a cloud service). Implementations report progress back to the
//! client by sending `ClientEvent`s on the sender they were built with.

use crate::Result;

/// Speech-to-text capture
///
/// After `start_listening`, implementations send zero or more
/// `ClientEvent::TranscriptUpdated` and exactly one
/// `ClientEvent::CaptureStopped` carrying the final transcript.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin capturing one utterance
    ///
    /// # Errors
    ///
    /// Returns error if capture cannot start
    fn start_listening(&self) -> Result<()>;

    /// End the current capture early
    ///
    /// # Errors
    ///
    /// Returns error if the capture cannot be stopped
    fn stop_listening(&self) -> Result<()>;
}

/// Text-to-speech playback
///
/// Implementations send `ClientEvent::SpeechStarted` when audio begins and
/// `ClientEvent::SpeechEnded` when it finishes on its own. A cancelled
/// utterance sends no end notification.
pub trait SpeechSynthesizer: Send + Sync {
    /// Queue `text` for playback, replacing anything currently playing
    ///
    /// # Errors
    ///
    /// Returns error if playback cannot start
    fn speak(&self, text: &str) -> Result<()>;

    /// Stop playback immediately
    fn cancel(&self);
}
