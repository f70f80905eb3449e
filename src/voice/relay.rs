//! Client side of the prompt relay

use async_trait::async_trait;
use url::Url;

use crate::api::generate::{GenerateRequest, GenerateResponse};
use crate::{Error, Result};

/// Something that answers a prompt with text
#[async_trait]
pub trait PromptRelay: Send + Sync {
    /// Send `prompt` and wait for the response text
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Relay reached over HTTP at `{relay_url}/api/generate`
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpRelay {
    /// Create a relay client for the given base URL
    ///
    /// # Errors
    ///
    /// Returns error if the generate endpoint cannot be derived from the URL
    pub fn new(relay_url: &Url) -> Result<Self> {
        let mut base = relay_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let endpoint = base
            .join("api/generate")
            .map_err(|e| Error::Config(format!("invalid relay URL {relay_url}: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Full URL prompts are posted to
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PromptRelay for HttpRelay {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, "sending prompt to relay");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                prompt: Some(prompt.to_string()),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Relay(format!("relay returned {status}")));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Relay(format!("unreadable relay response: {e}")))?;

        Ok(body.response)
    }
}
