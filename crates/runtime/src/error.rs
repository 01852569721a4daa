use crate::model::ModelError;
use crate::tools::DispatchError;
use thiserror::Error;

/// Errors that abort a turn or prevent the runtime from starting.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// The model could not be reached or returned garbage.
    #[error("upstream model error: {0}")]
    Upstream(#[from] ModelError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type Result<T> = std::result::Result<T, Error>;
