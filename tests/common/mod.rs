//! Shared test utilities

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;
use voice_assistant::{
    ApiServerBuilder, Error, Result, SpeechRecognizer, SpeechSynthesizer, TextGenerator,
};

/// Text generator that answers every prompt with a fixed reply
pub struct StubGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    fn model(&self) -> &str {
        "stub-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Text generator whose provider is always down
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    fn model(&self) -> &str {
        "failing-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Provider("upstream unavailable".to_string()))
    }
}

/// Serve a relay backed by `generator` on an ephemeral local port
pub async fn spawn_relay(generator: Arc<dyn TextGenerator>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");

    let server = ApiServerBuilder::new(generator).build();
    tokio::spawn(server.serve(listener, std::future::pending()));

    addr
}

/// Recognizer that only counts calls; tests inject capture events themselves
#[derive(Default)]
pub struct RecordingRecognizer {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail_start: bool,
}

impl SpeechRecognizer for RecordingRecognizer {
    fn start_listening(&self) -> Result<()> {
        if self.fail_start {
            return Err(Error::Speech("microphone unavailable".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_listening(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Synthesizer that records what it was asked to say
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub spoken: Mutex<Vec<String>>,
    pub cancels: AtomicUsize,
}

impl RecordingSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
