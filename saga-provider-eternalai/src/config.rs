//! Application configuration for the saga story apps.
//!
//! Each app ships an `app_config.json` next to its server binary:
//!
//! ```json
//! {
//!   "api_key": "...",
//!   "prompt_endpoint": "https://agentic.eternalai.org",
//!   "result_endpoint": "https://agent-api.eternalai.org",
//!   "chat_agent": "uncensored-chat",
//!   "image_agent": "uncensored-imagine"
//! }
//! ```
//!
//! The API key may also come from the `ETERNAL_API_KEY` environment
//! variable, which takes precedence over the file so deployments don't
//! have to write secrets to disk.

use std::path::Path;

use saga_types::EternalError;
use serde::Deserialize;

use crate::client::EternalAi;

/// Environment variable consulted before the config file's `api_key`.
pub const API_KEY_ENV: &str = "ETERNAL_API_KEY";

/// Errors loading an [`AppConfig`] file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON.
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Deserialized `app_config.json`. All fields are optional; missing
/// endpoint/agent values fall back to the client defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// API key. Overridden by [`API_KEY_ENV`] when set.
    #[serde(default)]
    pub api_key: String,
    /// Base URL for prompt submission.
    #[serde(default)]
    pub prompt_endpoint: Option<String>,
    /// Base URL for result polling.
    #[serde(default)]
    pub result_endpoint: Option<String>,
    /// Agent for streaming chat.
    #[serde(default)]
    pub chat_agent: Option<String>,
    /// Agent for image generation.
    #[serde(default)]
    pub image_agent: Option<String>,
}

impl AppConfig {
    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolve the API key: environment variable first, then the file.
    pub fn resolve_key(&self) -> Option<String> {
        self.resolve_key_from(std::env::var(API_KEY_ENV).ok().as_deref())
    }

    fn resolve_key_from(&self, env_value: Option<&str>) -> Option<String> {
        env_value
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| {
                let key = self.api_key.trim();
                (!key.is_empty()).then(|| key.to_string())
            })
    }
}

impl EternalAi {
    /// Build a client from an [`AppConfig`].
    ///
    /// Fails fast with [`EternalError::MissingCredential`] when neither the
    /// environment nor the file provides a key; no request is ever sent
    /// with an empty credential.
    pub fn from_config(config: &AppConfig) -> Result<Self, EternalError> {
        let key = config.resolve_key().ok_or(EternalError::MissingCredential)?;

        let mut client = EternalAi::new(key);
        if let Some(url) = &config.prompt_endpoint {
            client = client.prompt_base(url.clone());
        }
        if let Some(url) = &config.result_endpoint {
            client = client.result_base(url.clone());
        }
        if let Some(agent) = &config.chat_agent {
            client = client.agent(agent.clone());
        }
        if let Some(agent) = &config.image_agent {
            client = client.image_agent(agent.clone());
        }
        Ok(client)
    }
}
