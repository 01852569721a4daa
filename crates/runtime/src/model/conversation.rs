//! Append-only conversation for a single turn.

use super::types::{Message, ToolCallRequest};
use serde_json::Value;

/// Ordered messages for one turn.
///
/// Messages can only be appended. A tool-result message can only be added
/// together with the tool-call message that produced it.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a turn with a system message and the user's text.
    pub fn start(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    /// Append an assistant tool-call message followed by its result.
    pub fn push_tool_exchange(&mut self, call: ToolCallRequest, result: &Value) {
        let name = call.name.clone();
        self.messages.push(Message::tool_call(call));
        self.messages.push(Message::tool_result(name, result));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
