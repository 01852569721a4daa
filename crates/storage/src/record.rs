//! Audit record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One completed tool invocation.
///
/// Records are created right after a tool returns and are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub function_name: String,
    /// Arguments exactly as the model supplied them.
    pub arguments: Value,
    pub result: Value,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    pub fn new(function_name: impl Into<String>, arguments: Value, result: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            function_name: function_name.into(),
            arguments,
            result,
        }
    }

    /// Arguments rendered as JSON text.
    pub fn arguments_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.arguments)
    }

    /// Result rendered as JSON text.
    pub fn result_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.result)
    }
}
