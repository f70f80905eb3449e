//! Generative-language providers
//!
//! The relay only needs "prompt in, text out", so providers sit behind the
//! `TextGenerator` trait and the HTTP layer never sees provider types.

mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiClient;

use crate::Result;

/// A hosted model that turns one prompt into one text completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier used for every completion
    fn model(&self) -> &str;

    /// Generate a single completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;
}
