//! In-process doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse};
use crate::tools::{ArgumentError, ParamType, ParameterSpec, Tool, ToolArguments, ToolSpec};

/// A tool with required string parameters that records what it was given.
pub struct RecordingTool {
    spec: ToolSpec,
    seen: Arc<Mutex<Vec<Map<String, Value>>>>,
    result: Value,
}

impl RecordingTool {
    pub fn new(name: &str, params: &[&str]) -> Self {
        let spec = params.iter().fold(
            ToolSpec::new(name, format!("test tool {name}")),
            |spec, param| spec.param(ParameterSpec::required(*param, ParamType::String)),
        );
        Self {
            spec,
            seen: Arc::default(),
            result: json!({"ok": true}),
        }
    }

    pub fn returning(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    pub fn with_spec(mut self, spec: ToolSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Arguments of every call, in order.
    pub fn seen(&self) -> Arc<Mutex<Vec<Map<String, Value>>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ArgumentError> {
        if let Some(missing) = self
            .spec
            .parameters
            .iter()
            .find(|p| p.required && !arguments.contains(&p.name))
        {
            return Err(ArgumentError::Missing(missing.name.clone()));
        }
        self.seen.lock().unwrap().push(arguments.0.clone());
        Ok(self.result.clone())
    }
}

/// A backend that answers from a fixed script and records every request.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<Result<String, ModelError>>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedBackend {
    pub fn new<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        let backend = Self::default();
        for reply in replies {
            backend.push(Ok(reply.to_string()));
        }
        backend
    }

    pub fn failing(error: ModelError) -> Self {
        let backend = Self::default();
        backend.push(Err(error));
        backend
    }

    pub fn push(&self, reply: Result<String, ModelError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Messages of every request, in call order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Backend for ScriptedBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Api("script exhausted".into())));
        reply.map(|content| ModelResponse { content })
    }
}
