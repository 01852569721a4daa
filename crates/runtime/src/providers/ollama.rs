//! Ollama chat backend.

use std::time::Duration;

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    stream: bool,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
struct ApiOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.rendered_text(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    message: ApiReply,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    #[serde(default)]
    content: String,
}

/// Builder for creating an Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaBackendBuilder {
    base_url: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OllamaBackendBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
            temperature: 0.0,
            timeout_secs: 300,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Upper bound for one model call.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn build(self) -> Result<OllamaBackend, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(OllamaBackend {
            client,
            endpoint: format!("{}/api/chat", self.base_url.trim_end_matches('/')),
            model: self.model,
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        })
    }
}

/// Ollama `/api/chat` backend, non-streaming.
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OllamaBackend {
    pub fn builder(model: impl Into<String>) -> OllamaBackendBuilder {
        OllamaBackendBuilder::new(model)
    }
}

impl std::fmt::Display for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ollama({}, {})", self.model, self.endpoint)
    }
}

impl Backend for OllamaBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            stream: false,
            options: ApiOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::from_transport(e, self.timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::from_body(e, self.timeout_secs))?;

        Ok(ModelResponse {
            content: api_response.message.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn sends_messages_and_returns_reply_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama3.1:8b",
                "stream": false,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "Hello, how are you?"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"message":{"role":"assistant","content":"Fine, thanks."},"done":true}"#)
            .create_async()
            .await;

        let backend = OllamaBackend::builder(DEFAULT_OLLAMA_MODEL)
            .base_url(server.url())
            .build()
            .unwrap();
        let messages = [Message::system("be brief"), Message::user("Hello, how are you?")];
        let reply = backend.call(ModelRequest { messages: &messages }).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.content, "Fine, thanks.");
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let backend = OllamaBackend::builder(DEFAULT_OLLAMA_MODEL)
            .base_url(server.url())
            .build()
            .unwrap();
        let messages = [Message::user("hi")];
        let err = backend
            .call(ModelRequest { messages: &messages })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Api(ref body) if body.contains("model not loaded")));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(3));
                w.write_all(br#"{"message":{"content":"late"}}"#)
            })
            .create_async()
            .await;

        let backend = OllamaBackend::builder(DEFAULT_OLLAMA_MODEL)
            .base_url(server.url())
            .timeout_secs(1)
            .build()
            .unwrap();
        let messages = [Message::user("hi")];
        let err = backend
            .call(ModelRequest { messages: &messages })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Timeout(1)));
    }

    #[tokio::test]
    async fn unparseable_body_is_an_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let backend = OllamaBackend::builder(DEFAULT_OLLAMA_MODEL)
            .base_url(server.url())
            .build()
            .unwrap();
        let messages = [Message::user("hi")];
        let err = backend
            .call(ModelRequest { messages: &messages })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }
}
