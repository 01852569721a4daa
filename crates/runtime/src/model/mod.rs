//! Conversation types and the model backend trait.

pub mod conversation;
pub mod errors;
pub mod types;

pub use conversation::Conversation;
pub use errors::ModelError;
pub use types::{Backend, Message, ModelRequest, ModelResponse, Role, ToolCallRequest};
