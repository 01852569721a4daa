use thiserror::Error;

/// A tool rejected its arguments as structurally invalid.
///
/// This is distinct from a tool reporting "no data" or a provider failure,
/// which tools return as an `{"error": ...}` result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing required parameter: {0}")]
    Missing(String),

    #[error("invalid parameter '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

impl ArgumentError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors from dispatching a tool call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The model named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool rejected the sanitized arguments.
    #[error("bad arguments for {tool}: {source}")]
    Argument {
        tool: String,
        #[source]
        source: ArgumentError,
    },

    /// The tool ran but its audit record could not be written.
    #[error("audit log: {0}")]
    Audit(#[from] storage::Error),
}
