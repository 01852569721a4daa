//! Model provider adapters.
//!
//! Each provider implements [`Backend`] for its specific API.
//! [`ModelBackend`] picks one at startup from [`ModelSettings`].

mod ollama;
mod openai;

pub use ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, OllamaBackend, OllamaBackendBuilder};
pub use openai::{DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, OpenAiBackend, OpenAiBackendBuilder};

use crate::model::{Backend, ModelError, ModelRequest, ModelResponse};
use crate::{Error, Result};
use serde::Deserialize;

/// Which provider API to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    OpenAi,
}

impl std::str::FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("unknown model provider '{other}'"))),
        }
    }
}

/// Model configuration, the `[model]` table of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: Provider,
    /// Defaults per provider when unset.
    pub base_url: Option<String>,
    /// Model name. Defaults per provider when unset.
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            base_url: None,
            name: None,
            api_key: None,
            timeout_secs: 300,
            temperature: 0.0,
        }
    }
}

/// The configured backend.
pub enum ModelBackend {
    Ollama(OllamaBackend),
    OpenAi(OpenAiBackend),
}

impl ModelBackend {
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        match settings.provider {
            Provider::Ollama => {
                let model = settings.name.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL);
                let backend = OllamaBackend::builder(model)
                    .base_url(settings.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL))
                    .temperature(settings.temperature)
                    .timeout_secs(settings.timeout_secs)
                    .build()
                    .map_err(client_error)?;
                Ok(Self::Ollama(backend))
            }
            Provider::OpenAi => {
                let api_key = settings
                    .api_key
                    .as_deref()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| Error::Config("openai provider requires an api key".into()))?;
                let model = settings.name.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
                let backend = OpenAiBackend::builder(api_key, model)
                    .base_url(settings.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_URL))
                    .temperature(settings.temperature)
                    .timeout_secs(settings.timeout_secs)
                    .build()
                    .map_err(client_error)?;
                Ok(Self::OpenAi(backend))
            }
        }
    }
}

// Building the HTTP client happens once at startup, so its failure is a
// configuration problem rather than an upstream one.
fn client_error(err: ModelError) -> Error {
    Error::Config(format!("failed to build model client: {err}"))
}

impl std::fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama(backend) => backend.fmt(f),
            Self::OpenAi(backend) => backend.fmt(f),
        }
    }
}

impl Backend for ModelBackend {
    async fn call(
        &self,
        request: ModelRequest<'_>,
    ) -> std::result::Result<ModelResponse, ModelError> {
        match self {
            Self::Ollama(backend) => backend.call(request).await,
            Self::OpenAi(backend) => backend.call(request).await,
        }
    }
}
