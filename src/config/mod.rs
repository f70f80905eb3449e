//! Configuration management for the voice assistant
//!
//! Values resolve in priority order: environment, TOML file, defaults.

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;
use url::Url;

pub use file::ConfigFile;

use crate::{Error, Result};

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini REST API root
pub const DEFAULT_PROVIDER_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Relay port used when nothing else is configured
pub const DEFAULT_PORT: u16 = 3000;

/// Relay URL the client uses when nothing else is configured
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000";

/// Voice assistant configuration
#[derive(Debug)]
pub struct Config {
    /// Generative-language provider settings
    pub provider: ProviderConfig,

    /// Relay HTTP server settings
    pub server: ServerConfig,

    /// Voice client settings
    pub client: ClientConfig,
}

/// Provider settings
#[derive(Debug)]
pub struct ProviderConfig {
    /// Provider credential (from `GEMINI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Fixed model identifier for every completion
    pub model: String,

    /// Provider API base URL
    pub base_url: Url,
}

/// Relay HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Path to static files directory (browser client)
    pub static_dir: Option<PathBuf>,
}

/// Voice client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base URL; `/api/generate` is appended
    pub relay_url: Url,
}

impl Config {
    /// Load configuration from the process environment and the config file
    ///
    /// `VOICE_CONFIG` overrides the config file location.
    ///
    /// # Errors
    ///
    /// Returns error if a configured URL is invalid
    pub fn load() -> Result<Self> {
        let path = std::env::var("VOICE_CONFIG").ok().map(PathBuf::from);
        let fc = file::load_config_file(path);
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured URL is invalid
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let provider_url = env("VOICE_PROVIDER_URL")
            .or(fc.provider.base_url)
            .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string());

        let provider = ProviderConfig {
            api_key: env("GEMINI_API_KEY")
                .or(fc.provider.api_key)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            model: env("VOICE_MODEL")
                .or(fc.provider.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: parse_url("provider base URL", &provider_url)?,
        };

        let server = ServerConfig {
            host: env("VOICE_HOST")
                .or(fc.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: ["VOICE_PORT", "PORT"]
                .into_iter()
                .find_map(|key| env(key).and_then(|value| parse_port(key, &value)))
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("VOICE_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        let relay_url = env("VOICE_RELAY_URL")
            .or(fc.client.relay_url)
            .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());

        let client = ClientConfig {
            relay_url: parse_url("relay URL", &relay_url)?,
        };

        Ok(Self {
            provider,
            server,
            client,
        })
    }
}

impl ProviderConfig {
    /// Take the provider credential, failing if none was configured
    ///
    /// # Errors
    ///
    /// Returns error if `GEMINI_API_KEY` is unset in both env and file
    pub fn require_api_key(&mut self) -> Result<SecretString> {
        self.api_key
            .take()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))
    }
}

/// Parse a URL setting
///
/// # Errors
///
/// Returns error naming the setting if the value is not an absolute URL
pub fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Config(format!("invalid {name} {value:?}: {e}")))
}

/// Parse a port from the environment, warning and skipping invalid values
fn parse_port(name: &str, value: &str) -> Option<u16> {
    match value.parse() {
        Ok(port) => Some(port),
        Err(e) => {
            tracing::warn!(var = name, value, error = %e, "ignoring invalid port");
            None
        }
    }
}
