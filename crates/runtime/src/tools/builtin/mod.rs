//! Built-in data tools: weather, news and currency conversion.
//!
//! Each tool normalizes its own arguments, calls one external provider and
//! turns every data-level failure into an `{"error": ...}` result.

mod currency;
mod news;
mod weather;

pub use currency::CurrencyTool;
pub use news::NewsTool;
pub use weather::{ForecastEntry, ForecastSummary, WeatherTool, summarize_forecast};

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::ToolRegistry;

const DEFAULT_TIMEOUT_SECS: u64 = 12;

/// Provider credentials and endpoints for the built-in tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub openweather_api_key: Option<String>,
    pub newsapi_key: Option<String>,
    /// Per-request timeout for provider calls.
    pub timeout_secs: u64,
    pub openweather_url: String,
    pub newsapi_url: String,
    pub frankfurter_url: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            newsapi_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            openweather_url: "https://api.openweathermap.org".to_string(),
            newsapi_url: "https://newsapi.org".to_string(),
            frankfurter_url: "https://api.frankfurter.app".to_string(),
        }
    }
}

impl ToolSettings {
    pub(crate) fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

/// Registry holding the weather, news and currency tools, in that order.
pub fn default_registry(settings: &ToolSettings) -> Result<ToolRegistry, reqwest::Error> {
    let client = settings.http_client()?;
    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new(client.clone(), settings));
    registry.register(NewsTool::new(client.clone(), settings));
    registry.register(CurrencyTool::new(client, settings));
    Ok(registry)
}

/// Failure talking to a provider, reported to the model as data.
#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `body` is the provider's response.
    #[error("provider returned {status}")]
    Status { status: u16, body: Value },

    #[error("{0}")]
    Data(String),
}

impl FetchError {
    pub(crate) fn into_result(self) -> Value {
        match self {
            Self::Status { body, .. } => json!({ "error": body }),
            other => error_result(other),
        }
    }
}

pub(crate) fn error_result(reason: impl std::fmt::Display) -> Value {
    json!({ "error": reason.to_string() })
}

/// Send a GET request and decode a JSON success body.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
