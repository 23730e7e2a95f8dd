//! Executor: turns cortex decisions into tool calls.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::config::{AgentNode, EXECUTOR_SYSTEM_PROMPT};
use crate::model::{MessageBuilder, StructuredOutput};
use crate::tools::{ExecutorMessage, ToolCall};

use super::context::AgentContext;
use super::error::AgentError;
use super::retry::{invoke_agent, with_retries};
use super::state::{SessionState, StateUpdate};

/// Thought emitted when the cortex left nothing to execute.
pub const NO_DECISIONS_THOUGHT: &str = "No structured decisions found, I cannot execute anything.";

/// A tool call as requested by the model; the ID may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl RequestedToolCall {
    fn into_tool_call(self) -> ToolCall {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        ToolCall::new(id, self.name, self.args)
    }
}

/// Structured answer of the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOutput {
    #[serde(default)]
    pub tool_calls: Vec<RequestedToolCall>,
}

impl StructuredOutput for ExecutorOutput {
    const NAME: &'static str = "ExecutorOutput";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "tool_calls": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "name": {"type": "string"},
                            "args": {"type": "object"}
                        },
                        "required": ["name", "args"]
                    }
                }
            },
            "required": ["tool_calls"]
        })
    }
}

pub struct ExecutorNode<'a> {
    ctx: AgentContext<'a>,
}

impl<'a> ExecutorNode<'a> {
    pub fn new(ctx: AgentContext<'a>) -> Self {
        Self { ctx }
    }

    /// Ask the model for the tool calls implementing the latest decisions.
    ///
    /// The calls are recorded in the executor transcript; the tool node runs
    /// them.
    pub async fn run(&self, state: &SessionState) -> Result<StateUpdate, AgentError> {
        let decisions = match state.structured_decisions.as_deref() {
            Some(decisions) if !decisions.trim().is_empty() => decisions,
            _ => {
                tracing::warn!("{}", NO_DECISIONS_THOUGHT);
                return Ok(StateUpdate::new(AgentNode::Executor).with_thought(NO_DECISIONS_THOUGHT));
            }
        };

        let thought = state
            .cortex_last_thought
            .clone()
            .or_else(|| state.last_thought().map(str::to_string))
            .unwrap_or_default();
        let messages = self.build_messages(state, &thought, decisions);

        let output: ExecutorOutput = with_retries("Executor", self.ctx.retry, |_| {
            invoke_agent::<ExecutorOutput>(self.ctx.llm, AgentNode::Executor, &messages)
        })
        .await
        .map_err(|e| AgentError::llm(AgentNode::Executor, e))?;

        let tool_calls: Vec<ToolCall> = output
            .tool_calls
            .into_iter()
            .map(RequestedToolCall::into_tool_call)
            .collect();
        tracing::info!(
            "Executor requested {} tool call(s): {:?}",
            tool_calls.len(),
            tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );

        Ok(StateUpdate::new(AgentNode::Executor).append_messages(vec![
            ExecutorMessage::AiToolCalls {
                thought: Some(thought).filter(|t| !t.is_empty()),
                tool_calls,
            },
        ]))
    }

    fn build_messages(&self, state: &SessionState, thought: &str, decisions: &str) -> Vec<Value> {
        let text = format!(
            "Goal: {}\n\nCortex reasoning:\n{}\n\nDecisions to execute:\n{}",
            state.initial_goal, thought, decisions
        );
        vec![
            MessageBuilder::create_system_message(&self.ctx.system_prompt(EXECUTOR_SYSTEM_PROMPT)),
            MessageBuilder::create_user_message(&text, None),
        ]
    }
}

/// Tool calls of the pending executor request, if it has any.
pub fn pending_tool_calls(state: &SessionState) -> &[ToolCall] {
    match state.executor_messages.last() {
        Some(ExecutorMessage::AiToolCalls { tool_calls, .. }) => tool_calls,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{ScriptedLlm, ScriptedProvider};
    use crate::config::RetryPolicy;
    use crate::device::{DeviceContext, DevicePlatform};
    use crate::tools::ToolSpec;

    #[tokio::test]
    async fn test_no_decisions() {
        let provider = ScriptedProvider::new();
        let retry = RetryPolicy::default();
        let device = DeviceContext::new("d", DevicePlatform::Ios, 390, 844);
        let ctx = AgentContext {
            llm: &provider,
            retry: &retry,
            device: &device,
            tools: &[],
        };

        let update = ExecutorNode::new(ctx)
            .run(&SessionState::new("goal", 10))
            .await
            .unwrap();
        assert_eq!(
            update.agents_thoughts,
            vec![format!("[executor] {}", NO_DECISIONS_THOUGHT)]
        );
        assert!(update.executor_messages.is_none());
    }

    #[tokio::test]
    async fn test_tool_calls_recorded_with_ids() {
        let llm = ScriptedLlm::answering(vec![json!({
            "tool_calls": [
                {"id": "call-1", "name": "tap", "args": {"x": 10}},
                {"name": "glimpse_screen", "args": {}}
            ]
        })]);
        let provider = ScriptedProvider::new().with(AgentNode::Executor, llm.clone());
        let retry = RetryPolicy::default();
        let device = DeviceContext::new("d", DevicePlatform::Android, 1080, 2400);
        let tools = vec![ToolSpec::new("tap", "Tap the screen")];
        let ctx = AgentContext {
            llm: &provider,
            retry: &retry,
            device: &device,
            tools: &tools,
        };
        let mut state = SessionState::new("goal", 10);
        state.structured_decisions = Some(r#"{"tap": "wifi"}"#.to_string());
        state.cortex_last_thought = Some("Wifi toggle is visible".to_string());

        let update = ExecutorNode::new(ctx).run(&state).await.unwrap();
        state.apply(update);

        let calls = pending_tool_calls(&state);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call-1");
        assert!(Uuid::parse_str(&calls[1].id).is_ok());

        let prompt = MessageBuilder::text_of(&llm.calls()[0][1]);
        assert!(prompt.contains("Wifi toggle is visible"));
        let system = MessageBuilder::text_of(&llm.calls()[0][0]);
        assert!(system.contains("android"));
    }
}
