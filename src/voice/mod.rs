//! Voice client
//!
//! Turns a spoken question into a relay request and speaks the answer.
//! Speech recognition and synthesis are injected capabilities; the
//! idle/listening/loading/speaking flow lives in `VoiceMachine`.

mod capabilities;
mod client;
pub mod console;
mod machine;
mod relay;

pub use capabilities::{SpeechRecognizer, SpeechSynthesizer};
pub use client::{ClientEvent, EventReceiver, EventSender, VoiceClient, event_channel};
pub use machine::{ClientState, ClientView, Effect, FALLBACK_MESSAGE, VoiceMachine};
pub use relay::{HttpRelay, PromptRelay};
