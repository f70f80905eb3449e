//! TOML configuration file loading
//!
//! Supports `~/.config/voice-assistant/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Generative-language provider configuration
    #[serde(default)]
    pub provider: ProviderFileConfig,

    /// Relay server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Voice client configuration
    #[serde(default)]
    pub client: ClientFileConfig,
}

/// Provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct ProviderFileConfig {
    /// Provider credential
    pub api_key: Option<String>,

    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,
}

/// Relay server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,

    /// Directory holding the browser client to serve
    pub static_dir: Option<String>,
}

/// Voice client configuration
#[derive(Debug, Default, Deserialize)]
pub struct ClientFileConfig {
    /// Base URL of the relay the client talks to
    pub relay_url: Option<String>,
}

/// Parse a config file from disk
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn parse_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load the TOML config file from `path`, or from the standard path if `None`
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<PathBuf>) -> ConfigFile {
    let Some(path) = path.or_else(config_file_path) else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match parse_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-assistant/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-assistant").join("config.toml"))
}
