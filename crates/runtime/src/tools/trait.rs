//! Tool trait.

use super::{ArgumentError, ToolArguments, ToolSpec};
use async_trait::async_trait;
use serde_json::Value;

/// An executable tool with its spec carried alongside it.
///
/// `execute` only ever sees arguments filtered to the spec's declared
/// parameters. "No data" conditions and provider failures are returned as
/// `{"error": reason}`; an `Err` means the call shape itself was wrong.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ArgumentError>;
}
