//! Configuration loading from parley.toml and the environment.

use runtime::tools::builtin::ToolSettings;
use runtime::{ModelSettings, Provider};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "parley.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelSettings,
    pub tools: ToolSettings,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `parley serve`.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// SQLite file holding the function call log.
    pub db_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./function_calls.db"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path`, or `parley.toml` when it exists, then apply environment
    /// overrides. An explicit path that cannot be read is an error.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`. Empty values are
    /// ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(addr) = var("PARLEY_ADDR") {
            self.server.addr = addr;
        }
        if let Some(provider) = var("PARLEY_PROVIDER") {
            self.model.provider = provider
                .parse()
                .map_err(|e: runtime::Error| ConfigError::Invalid(e.to_string()))?;
        }
        if let Some(url) = var("PARLEY_MODEL_URL") {
            self.model.base_url = Some(url);
        }
        let model_name = match self.model.provider {
            Provider::OpenAi => var("PARLEY_MODEL").or_else(|| var("OPENAI_MODEL")),
            Provider::Ollama => var("PARLEY_MODEL"),
        };
        if let Some(name) = model_name {
            self.model.name = Some(name);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(key) = var("OPENWEATHER_API_KEY") {
            self.tools.openweather_api_key = Some(key);
        }
        if let Some(key) = var("NEWSAPI_KEY") {
            self.tools.newsapi_key = Some(key);
        }
        if let Some(path) = var("FUNCTION_LOG_DB") {
            self.audit.db_path = PathBuf::from(path);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:8000");
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.timeout_secs, 300);
        assert_eq!(config.tools.timeout_secs, 12);
        assert_eq!(config.audit.db_path, PathBuf::from("./function_calls.db"));
    }

    #[test]
    fn file_values_are_read() {
        let config = Config::parse(
            r#"
            [server]
            addr = "0.0.0.0:9000"

            [model]
            provider = "openai"
            name = "gpt-4o"
            api_key = "sk-file"

            [tools]
            newsapi_key = "news"

            [audit]
            db_path = "/tmp/calls.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(config.model.provider, Provider::OpenAi);
        assert_eq!(config.model.name.as_deref(), Some("gpt-4o"));
        assert_eq!(config.tools.newsapi_key.as_deref(), Some("news"));
        assert_eq!(config.audit.db_path, PathBuf::from("/tmp/calls.db"));
    }

    #[test]
    fn unknown_provider_is_a_parse_error() {
        assert!(matches!(
            Config::parse("[model]\nprovider = \"gemini\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = Config::parse("[model]\nname = \"from-file\"").unwrap();
        config
            .apply_overrides(env(&[
                ("PARLEY_ADDR", "0.0.0.0:8080"),
                ("PARLEY_MODEL", "llama3.2"),
                ("NEWSAPI_KEY", "n-key"),
                ("OPENWEATHER_API_KEY", "w-key"),
                ("FUNCTION_LOG_DB", "audit.db"),
            ]))
            .unwrap();

        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.model.name.as_deref(), Some("llama3.2"));
        assert_eq!(config.tools.newsapi_key.as_deref(), Some("n-key"));
        assert_eq!(config.tools.openweather_api_key.as_deref(), Some("w-key"));
        assert_eq!(config.audit.db_path, PathBuf::from("audit.db"));
    }

    #[test]
    fn openai_model_env_applies_only_to_openai() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("OPENAI_MODEL", "gpt-4o")]))
            .unwrap();
        assert_eq!(config.model.name, None);

        config
            .apply_overrides(env(&[
                ("PARLEY_PROVIDER", "openai"),
                ("OPENAI_MODEL", "gpt-4o"),
                ("OPENAI_API_KEY", "sk-env"),
            ]))
            .unwrap();
        assert_eq!(config.model.provider, Provider::OpenAi);
        assert_eq!(config.model.name.as_deref(), Some("gpt-4o"));
        assert_eq!(config.model.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("PARLEY_ADDR", "  "), ("NEWSAPI_KEY", "")]))
            .unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:8000");
        assert_eq!(config.tools.newsapi_key, None);
    }

    #[test]
    fn bad_provider_env_is_invalid() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("PARLEY_PROVIDER", "gemini")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let err = Config::resolve(Some(Path::new("/nonexistent/parley.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
