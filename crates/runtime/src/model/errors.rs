use thiserror::Error;

/// Errors from model backend calls.
///
/// Every variant is an upstream failure: the turn that hit it is aborted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The backend could not be reached.
    #[error("network: {0}")]
    Network(String),

    /// The call did not finish within the configured timeout.
    #[error("model call timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with a non-success status.
    #[error("provider api: {0}")]
    Api(String),

    /// The backend response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Classify a transport error from `reqwest`.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Classify a failure while reading or decoding a response body.
    pub(crate) fn from_body(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else {
            Self::InvalidResponse(err.to_string())
        }
    }
}
