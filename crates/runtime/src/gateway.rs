//! Model gateway: sends conversations to the backend and reads replies
//! against the structured-output contract.
//!
//! The contract has two shapes:
//!
//! ```text
//! {"tool": "TOOL_NAME", "arguments": {...}}
//! {"tool": null, "final": "..."}
//! ```

use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCallRequest,
};
use crate::tools::ToolSpec;

const CONTRACT_RULES: &str = r#"Respond with JSON only, no prose and no code fences. Use exactly one of these shapes:
1. To call a tool: {"tool": "TOOL_NAME", "arguments": {...}}
2. To answer directly: {"tool": null, "final": "your answer"}

Date rules for tool arguments:
- If the user says today, use "today".
- If the user says tomorrow, use "tomorrow".
- Keep any explicit date as YYYY-MM-DD.
Never compute dates yourself."#;

/// What a pass-1 reply turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    ToolCall(ToolCallRequest),
    /// Answer text: the `final` field of a direct-answer payload, or the raw
    /// reply when it does not follow the contract.
    Direct(String),
}

/// Sends conversations to one model backend.
#[derive(Debug, Clone)]
pub struct Gateway<B> {
    backend: B,
}

impl<B: Backend> Gateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Send `conversation` and return the raw reply.
    ///
    /// With `tools`, the model sees exactly one system message, placed first.
    /// Earlier system messages are not discarded: their text, in order, becomes
    /// the preamble of that message, followed by the tool list and the output
    /// contract. Without `tools` the conversation is sent unchanged.
    pub async fn complete(
        &self,
        conversation: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ModelResponse, ModelError> {
        let Some(tools) = tools else {
            debug!(messages = conversation.len(), "calling model");
            return self.backend.call(ModelRequest { messages: conversation }).await;
        };

        let preamble: Vec<&str> = conversation
            .iter()
            .filter(|m| m.role == Role::System)
            .map(Message::text)
            .collect();
        let mut system = preamble.join("\n\n");
        if !system.is_empty() {
            system.push_str("\n\n");
        }
        system.push_str(&tool_calling_prompt(tools));

        let messages: Vec<Message> = std::iter::once(Message::system(system))
            .chain(conversation.iter().filter(|m| m.role != Role::System).cloned())
            .collect();

        debug!(messages = messages.len(), tools = tools.len(), "calling model with tools");
        self.backend.call(ModelRequest { messages: &messages }).await
    }
}

/// The system instructions advertising `tools` and the output contract.
pub fn tool_calling_prompt(tools: &[ToolSpec]) -> String {
    let advertised = Value::Array(tools.iter().map(ToolSpec::advertised).collect());
    format!(
        "You are a tool-calling assistant.\n\nAvailable tools (JSON):\n{}\n\n{CONTRACT_RULES}",
        serde_json::to_string_pretty(&advertised).unwrap_or_else(|_| advertised.to_string())
    )
}

/// Read a reply against the contract. Never fails: anything that is not a
/// well-formed tool call is a direct answer.
pub fn parse_reply(raw: &str) -> Reply {
    let Ok(Value::Object(mut payload)) = serde_json::from_str::<Value>(strip_code_fence(raw)) else {
        return Reply::Direct(raw.to_string());
    };

    match payload.get("tool") {
        Some(Value::String(name)) if !name.trim().is_empty() => {
            let name = name.trim().to_string();
            let arguments = match payload.remove("arguments") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(arguments)) => arguments,
                Some(_) => return Reply::Direct(raw.to_string()),
            };
            Reply::ToolCall(ToolCallRequest::new(name, arguments))
        }
        None | Some(Value::Null) => match payload.remove("final") {
            Some(Value::String(answer)) => Reply::Direct(answer),
            _ => Reply::Direct(raw.to_string()),
        },
        Some(_) => Reply::Direct(raw.to_string()),
    }
}

/// The tool call in `raw`, if it holds a well-formed one.
pub fn extract_tool_call(raw: &str) -> Option<ToolCallRequest> {
    match parse_reply(raw) {
        Reply::ToolCall(call) => Some(call),
        Reply::Direct(_) => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    match inner.split_once('\n') {
        // ```json
        Some((tag, body)) if !tag.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;
    use crate::tools::{ParamType, ParameterSpec};
    use serde_json::json;

    fn currency_spec() -> ToolSpec {
        ToolSpec::new("convert_currency", "Convert currency")
            .param(ParameterSpec::required("amount", ParamType::Number))
            .param(ParameterSpec::required("base", ParamType::String))
            .param(ParameterSpec::required("target", ParamType::String))
    }

    #[test]
    fn tool_call_shape_is_recognized() {
        let call = extract_tool_call(
            r#"{"tool":"convert_currency","arguments":{"amount":500,"base":"INR","target":"USD"}}"#,
        )
        .unwrap();
        assert_eq!(call.name, "convert_currency");
        assert_eq!(
            Value::Object(call.arguments),
            json!({"amount": 500, "base": "INR", "target": "USD"})
        );
    }

    #[test]
    fn fenced_payload_is_unwrapped() {
        let raw = "```json\n{\"tool\": \"get_news_for_city\", \"arguments\": {\"city\": \"Pune\"}}\n```";
        assert_eq!(extract_tool_call(raw).unwrap().name, "get_news_for_city");

        let bare = "```{\"tool\": \"get_news_for_city\"}```";
        assert_eq!(extract_tool_call(bare).unwrap().name, "get_news_for_city");
    }

    #[test]
    fn missing_arguments_mean_empty_arguments() {
        let call = extract_tool_call(r#"{"tool":"get_news_for_city"}"#).unwrap();
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn direct_answer_uses_final_text() {
        assert_eq!(
            parse_reply(r#"{"tool": null, "final": "I'm doing well!"}"#),
            Reply::Direct("I'm doing well!".into())
        );
    }

    #[test]
    fn malformed_output_degrades_to_raw_text() {
        for raw in [
            "Sure, the weather is nice.",
            r#"{"tool": "convert_currency", "arguments": [1, 2]}"#,
            r#"{"tool": ""}"#,
            r#"{"tool": 7}"#,
            r#"{"tool": null}"#,
            r#"["tool"]"#,
            "",
        ] {
            assert_eq!(parse_reply(raw), Reply::Direct(raw.into()), "raw: {raw}");
        }
    }

    #[test]
    fn prompt_lists_tools_and_date_rule() {
        let prompt = tool_calling_prompt(&[currency_spec()]);
        assert!(prompt.contains("\"name\": \"convert_currency\""));
        assert!(prompt.contains("\"required\""));
        assert!(prompt.contains(r#"{"tool": null, "final": "your answer"}"#));
        assert!(prompt.contains(r#"use "tomorrow""#));
    }

    #[tokio::test]
    async fn tools_fold_system_messages_into_one() {
        let backend = ScriptedBackend::new([r#"{"tool":null,"final":"hi"}"#]);
        let gateway = Gateway::new(backend.clone());
        let conversation = [Message::system("You are helpful."), Message::user("Hello")];

        let tools = [currency_spec()];
        gateway
            .complete(&conversation, Some(&tools[..]))
            .await
            .unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[0].text().starts_with("You are helpful.\n\n"));
        assert!(sent[0].text().contains("convert_currency"));
        assert_eq!(sent[1], Message::user("Hello"));
    }

    #[tokio::test]
    async fn later_system_messages_move_into_the_leading_one() {
        let backend = ScriptedBackend::new([r#"{"tool":null,"final":"ok"}"#]);
        let gateway = Gateway::new(backend.clone());
        let conversation = [
            Message::system("first"),
            Message::user("Hello"),
            Message::system("second"),
        ];

        let tools = [currency_spec()];
        gateway
            .complete(&conversation, Some(&tools[..]))
            .await
            .unwrap();

        let sent = &backend.requests()[0];
        let systems: Vec<&Message> = sent.iter().filter(|m| m.role == Role::System).collect();
        assert_eq!(systems.len(), 1);
        assert!(sent[0].text().starts_with("first\n\nsecond\n\nYou are a tool-calling assistant."));
        assert_eq!(&sent[1..], &[Message::user("Hello")]);
    }

    #[tokio::test]
    async fn without_tools_the_conversation_is_sent_as_is() {
        let backend = ScriptedBackend::new(["Done."]);
        let gateway = Gateway::new(backend.clone());
        let conversation = [
            Message::system("a"),
            Message::user("b"),
            Message::system("c"),
        ];

        let reply = gateway.complete(&conversation, None).await.unwrap();

        assert_eq!(reply.content, "Done.");
        assert_eq!(backend.requests()[0], conversation.to_vec());
    }

    #[tokio::test]
    async fn backend_failure_is_returned() {
        let gateway = Gateway::new(ScriptedBackend::failing(ModelError::Timeout(300)));
        let err = gateway
            .complete(&[Message::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Timeout(300)));
    }
}
