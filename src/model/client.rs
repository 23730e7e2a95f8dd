//! Structured-output LLM seam shared by every agent.
//!
//! The crate never talks to a provider directly. Hosts implement
//! [`LlmClient`] (one per model) and [`LlmProvider`] (resolves the client
//! for an agent), and the agents only ever ask for schema-conforming JSON.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AgentNode;

/// LLM invocation errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse structured output: {0}")]
    ParseError(String),
    #[error("LLM returned an empty result")]
    EmptyResponse,
    #[error("No LLM configured for {0}")]
    NotConfigured(AgentNode),
    #[error("LLM has no fallback for {0}")]
    NoFallback(AgentNode),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A named JSON schema derived from a Rust output type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Shape the LLM answer must follow.
///
/// Resolved once where the call is built, never inspected dynamically
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSchema {
    /// Free-form answer.
    NoSchema,
    /// Caller-supplied JSON schema.
    Json(Value),
    /// Schema of a [`StructuredOutput`] type.
    Typed(TypedSchema),
}

impl OutputSchema {
    /// Schema for a typed output.
    pub fn typed<T: StructuredOutput>() -> Self {
        Self::Typed(TypedSchema {
            name: T::NAME,
            schema: T::json_schema(),
        })
    }

    /// The JSON schema, if any.
    pub fn json_schema(&self) -> Option<&Value> {
        match self {
            Self::NoSchema => None,
            Self::Json(schema) => Some(schema),
            Self::Typed(typed) => Some(&typed.schema),
        }
    }
}

/// An output type an agent requests from the LLM.
pub trait StructuredOutput: DeserializeOwned {
    /// Schema name sent along with the request.
    const NAME: &'static str;

    /// JSON schema describing `Self`.
    fn json_schema() -> Value;

    /// Decode a raw LLM answer.
    ///
    /// Objects are decoded directly. Strings are searched for a JSON object
    /// first, which covers providers that only offer a JSON mode.
    fn from_value(value: Value) -> Result<Self, LlmError> {
        let value = match value {
            Value::String(text) => {
                let json = extract_json(&text).ok_or_else(|| {
                    LlmError::ParseError(format!("no JSON object in answer: {}", text))
                })?;
                serde_json::from_str(&json).map_err(|e| LlmError::ParseError(e.to_string()))?
            }
            other => other,
        };
        serde_json::from_value(value).map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

/// A single model capable of structured output.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a message sequence and return the model answer.
    ///
    /// `Ok(None)` means the model produced nothing usable; callers decide
    /// whether that is an error.
    async fn invoke(&self, messages: &[Value], schema: &OutputSchema)
        -> Result<Option<Value>, LlmError>;
}

/// Resolves the model for each agent.
pub trait LlmProvider: Send + Sync {
    /// Client for `agent`, or its fallback model when `use_fallback` is set.
    fn llm(&self, agent: AgentNode, use_fallback: bool) -> Result<Arc<dyn LlmClient>, LlmError>;
}

/// Invoke `llm` and decode the answer as `T`.
pub async fn invoke_structured<T: StructuredOutput>(
    llm: &dyn LlmClient,
    messages: &[Value],
) -> Result<Option<T>, LlmError> {
    let schema = OutputSchema::typed::<T>();
    match llm.invoke(messages, &schema).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => T::from_value(value).map(Some),
    }
}

/// Extract a JSON object from a model answer.
///
/// Handles bare JSON, fenced code blocks and JSON embedded in prose.
pub fn extract_json(response: &str) -> Option<String> {
    let trimmed = response.trim();
    if trimmed.starts_with('{') && serde_json::from_str::<Value>(trimmed).is_ok() {
        return Some(trimmed.to_string());
    }

    // ```json\n{...}\n```
    if let Some(start) = response.find("```json") {
        let after_marker = &response[start + 7..];
        if let Some(end) = after_marker.find("```") {
            return Some(after_marker[..end].trim().to_string());
        }
    }

    // ```\n{...}\n```
    if let Some(start) = response.find("```") {
        let after_marker = &response[start + 3..];
        if let Some(end) = after_marker.find("```") {
            let block = after_marker[..end].trim();
            if block.starts_with('{') {
                return Some(block.to_string());
            }
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| response[start..=end].to_string())
}

/// Helper for building conversation messages.
pub struct MessageBuilder;

impl MessageBuilder {
    /// Create a system message.
    pub fn create_system_message(content: &str) -> Value {
        json!({
            "role": "system",
            "content": content
        })
    }

    /// Create a user message with optional image.
    ///
    /// # Arguments
    /// * `text` - Text content.
    /// * `image_base64` - Optional base64-encoded image.
    pub fn create_user_message(text: &str, image_base64: Option<&str>) -> Value {
        let mut content = Vec::new();

        if let Some(img_data) = image_base64 {
            content.push(json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:image/jpeg;base64,{}", img_data)
                }
            }));
        }

        content.push(json!({
            "type": "text",
            "text": text
        }));

        json!({
            "role": "user",
            "content": content
        })
    }

    /// Text of a message, concatenating text parts of multimodal content.
    pub fn text_of(message: &Value) -> String {
        match message.get("content") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(parts)) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}
