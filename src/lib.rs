//! Voice Assistant - voice-driven chat front-end and prompt relay
//!
//! This library provides both halves of the assistant:
//! - The prompt relay: a single-route HTTP service forwarding prompts to a
//!   hosted generative-language model
//! - The voice client: a state machine wiring speech capture and playback
//!   capabilities to relay requests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Voice Client               │
//! │  Recognizer → VoiceMachine → Synthesizer │
//! └────────────────────┬─────────────────────┘
//!                      │ POST /api/generate
//! ┌────────────────────▼─────────────────────┐
//! │               Prompt Relay               │
//! │        axum router → TextGenerator       │
//! └────────────────────┬─────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────┐
//! │          Gemini generateContent          │
//! └──────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod providers;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use error::{Error, Result};
pub use providers::{GeminiClient, TextGenerator};
pub use voice::{
    ClientEvent, ClientState, ClientView, HttpRelay, PromptRelay, SpeechRecognizer,
    SpeechSynthesizer, VoiceClient, VoiceMachine,
};
