//! Device tool calls and their results.
//!
//! Tools themselves (tap, swipe, screenshot bridges...) are provided by the
//! host through [`ToolExecutor`]. This module only defines what goes in and
//! what comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key of the executor transcript inside a wrapped tool update.
pub const EXECUTOR_MESSAGES_KEY: &str = "executor_messages";

/// Name of the tool that asks for a screenshot on the next observation.
pub const GLIMPSE_SCREEN_TOOL: &str = "glimpse_screen";

/// A single tool invocation requested by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// Outcome tag of a tool message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Result of one tool call, fed back to the cortex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
    pub status: ToolStatus,
}

impl ToolMessage {
    /// Successful result for `call`.
    pub fn success(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
            status: ToolStatus::Success,
        }
    }

    /// Failed result for `call`.
    pub fn error(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
            status: ToolStatus::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }
}

/// Entry of the executor transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutorMessage {
    /// Tool calls requested by the executor.
    AiToolCalls {
        #[serde(default)]
        thought: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call.
    Tool(ToolMessage),
}

impl ExecutorMessage {
    pub fn as_tool_message(&self) -> Option<&ToolMessage> {
        match self {
            Self::Tool(message) => Some(message),
            Self::AiToolCalls { .. } => None,
        }
    }
}

/// What a tool returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A tool message, returned directly.
    Message(ToolMessage),
    /// A state update whose `executor_messages` list ends with the tool
    /// message.
    Update(Value),
    /// Anything else; treated as a failed call.
    Raw(Value),
}

/// Description of a tool, used in prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Executes tool calls on the device.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools the executor may call.
    fn tool_specs(&self) -> Vec<ToolSpec>;

    /// Run one tool call.
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<ToolOutput>;
}

/// A wrapped tool update that does not carry a tool message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolContractError {
    #[error("Tool update is not an object")]
    NotAnObject,
    #[error("Tool update has no `{0}` key")]
    MissingKey(&'static str),
    #[error("Tool update has an empty `{0}` list")]
    EmptyMessages(&'static str),
    #[error("Tool update `{key}` is a {found}, expected a list or a tool message")]
    NotAList {
        key: &'static str,
        found: &'static str,
    },
    #[error("Last executor message is not a tool message: {0}")]
    NotAToolMessage(String),
}

/// Extract the tool message from a wrapped tool update.
///
/// The messages slot holds either a list, whose last entry is used, or a
/// single message.
pub fn tool_message_from_update(update: &Value) -> Result<ToolMessage, ToolContractError> {
    let object = update.as_object().ok_or(ToolContractError::NotAnObject)?;
    let messages = object
        .get(EXECUTOR_MESSAGES_KEY)
        .ok_or(ToolContractError::MissingKey(EXECUTOR_MESSAGES_KEY))?;
    let last = match messages {
        Value::Array(list) => list
            .last()
            .ok_or(ToolContractError::EmptyMessages(EXECUTOR_MESSAGES_KEY))?,
        Value::Object(_) => messages,
        other => {
            return Err(ToolContractError::NotAList {
                key: EXECUTOR_MESSAGES_KEY,
                found: value_type_name(other),
            })
        }
    };

    match serde_json::from_value::<ExecutorMessage>(last.clone()) {
        Ok(ExecutorMessage::Tool(message)) => Ok(message),
        Ok(other) => Err(ToolContractError::NotAToolMessage(format!("{:?}", other))),
        Err(e) => Err(ToolContractError::NotAToolMessage(e.to_string())),
    }
}

/// JSON type name of a value, for diagnostics.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
