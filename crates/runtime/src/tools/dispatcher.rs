//! Validates and executes tool calls, recording each completed one.

use std::sync::Arc;

use serde_json::{Map, Value};
use storage::{AuditRecord, AuditSink};
use tracing::{debug, info};

use super::{DispatchError, ToolArguments, ToolInvocation, ToolRegistry};

/// Executes named tools against a registry and writes audit records.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    audit: Arc<dyn AuditSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, audit: Arc<dyn AuditSink>) -> Self {
        Self { registry, audit }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run `name` with the model-supplied arguments.
    ///
    /// Undeclared keys are dropped before the tool sees them. Exactly one
    /// audit record, holding the arguments as supplied, is appended when the
    /// tool returns a result; unknown tools and argument errors record
    /// nothing.
    pub async fn invoke(
        &self,
        name: &str,
        raw_arguments: &Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        let tool = self
            .registry
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let (arguments, dropped) = ToolArguments::sanitize(tool.spec(), raw_arguments);
        if !dropped.is_empty() {
            debug!(tool = name, ?dropped, "dropped undeclared arguments");
        }
        let invocation = ToolInvocation {
            name: name.to_string(),
            arguments,
        };

        let result = tool
            .execute(&invocation.arguments)
            .await
            .map_err(|source| DispatchError::Argument {
                tool: invocation.name.clone(),
                source,
            })?;

        let record = AuditRecord::new(
            invocation.name,
            Value::Object(raw_arguments.clone()),
            result.clone(),
        );
        self.audit.append(&record)?;

        info!(
            tool = name,
            error = result.get("error").is_some(),
            "tool call completed"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
