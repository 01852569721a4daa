//! The conversation controller: one user message in, one [`TurnOutcome`] out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::Result;
use crate::gateway::{Gateway, Reply, parse_reply};
use crate::model::{Backend, Conversation};
use crate::tools::Dispatcher;

const SUMMARY_INSTRUCTION: &str =
    "Now write a final user-friendly answer. Do NOT call any tool. Do NOT return JSON.";

/// An incoming user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub user_id: String,
    pub message: String,
}

impl TurnRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }
}

/// The result of one turn, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnOutcome {
    Direct {
        response: String,
    },
    FunctionCall {
        function: String,
        /// Arguments exactly as the model supplied them.
        function_args: Map<String, Value>,
        function_result: Value,
        response: String,
    },
}

impl TurnOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::FunctionCall { .. } => "function_call",
        }
    }

    pub fn response(&self) -> &str {
        match self {
            Self::Direct { response } | Self::FunctionCall { response, .. } => response,
        }
    }
}

/// Runs turns against a model and a tool dispatcher.
///
/// Turns share nothing mutable except the dispatcher's audit sink, so one
/// `Assistant` can serve concurrent turns.
pub struct Assistant<B> {
    gateway: Gateway<B>,
    dispatcher: Dispatcher,
}

impl<B: Backend> Assistant<B> {
    pub fn new(backend: B, dispatcher: Dispatcher) -> Self {
        Self {
            gateway: Gateway::new(backend),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one user message.
    ///
    /// At most two model calls and one tool invocation are made. Model and
    /// dispatch failures abort the turn; tool-reported errors do not.
    pub async fn handle_turn(&self, request: &TurnRequest) -> Result<TurnOutcome> {
        let span = info_span!("turn", user_id = %request.user_id, turn_id = %Uuid::new_v4());
        self.run(&request.message).instrument(span).await
    }

    async fn run(&self, message: &str) -> Result<TurnOutcome> {
        let registry = self.dispatcher.registry();
        let mut conversation = Conversation::start(self.system_prompt(), message);

        let first = self
            .gateway
            .complete(conversation.messages(), Some(registry.specs()))
            .await?;

        let call = match parse_reply(&first.content) {
            Reply::Direct(response) => {
                info!(kind = "direct", "turn completed");
                return Ok(TurnOutcome::Direct { response });
            }
            Reply::ToolCall(call) => call,
        };

        debug!(tool = %call.name, "model requested tool");
        let result = self.dispatcher.invoke(&call.name, &call.arguments).await?;

        let hint = registry
            .lookup(&call.name)
            .and_then(|tool| tool.spec().presentation_hint.as_deref());
        let instruction = match hint {
            Some(hint) => format!("{SUMMARY_INSTRUCTION} {hint}"),
            None => SUMMARY_INSTRUCTION.to_string(),
        };

        let function = call.name.clone();
        let function_args = call.arguments.clone();
        conversation.push_tool_exchange(call, &result);
        conversation.push_system(instruction);

        let second = self.gateway.complete(conversation.messages(), None).await?;

        info!(kind = "function_call", tool = %function, "turn completed");
        Ok(TurnOutcome::FunctionCall {
            function,
            function_args,
            function_result: result,
            response: second.content,
        })
    }

    fn system_prompt(&self) -> String {
        let signatures: Vec<String> = self
            .dispatcher
            .registry()
            .specs()
            .iter()
            .map(|spec| spec.signature())
            .collect();
        format!(
            "You are an assistant that can call tools to fetch data. Available tools: {}. \
             If the user asks for something one of these tools provides, call the correct tool.",
            signatures.join(", ")
        )
    }
}
