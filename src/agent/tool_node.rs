//! Sequential execution of the executor's tool call batch.

use crate::config::AgentNode;
use crate::tools::{
    tool_message_from_update, value_type_name, ExecutorMessage, ToolCall, ToolContractError,
    ToolExecutor, ToolMessage, ToolOutput,
};

use super::error::AgentError;
use super::executor::pending_tool_calls;
use super::state::{SessionState, StateUpdate};

/// Content of the message recorded for calls skipped after a failure.
pub const ABORTED_MESSAGE: &str = "Aborted: a previous tool call failed!";

/// Runs tool calls one after the other on behalf of the executor.
pub struct ExecutorToolNode<'a> {
    tools: &'a dyn ToolExecutor,
}

impl<'a> ExecutorToolNode<'a> {
    pub fn new(tools: &'a dyn ToolExecutor) -> Self {
        Self { tools }
    }

    /// Execute `calls` strictly in order.
    ///
    /// Returns exactly one message per call. Once a call fails, the
    /// remaining calls are recorded as aborted and never executed.
    pub async fn run_batch(
        &self,
        calls: &[ToolCall],
    ) -> Result<Vec<ToolMessage>, ToolContractError> {
        let mut results = Vec::with_capacity(calls.len());
        let mut failed = false;

        for call in calls {
            if failed {
                results.push(ToolMessage::error(call, ABORTED_MESSAGE));
                continue;
            }

            let message = match self.tools.execute(call).await {
                Ok(ToolOutput::Message(message)) => message,
                Ok(ToolOutput::Update(update)) => tool_message_from_update(&update)?,
                Ok(ToolOutput::Raw(value)) => ToolMessage::error(
                    call,
                    format!("Unexpected tool output type: {}", value_type_name(&value)),
                ),
                Err(e) => ToolMessage::error(call, format!("{:#}", e)),
            };

            if message.is_error() {
                tracing::warn!("Tool {} failed: {}", call.name, message.content);
                failed = true;
            } else {
                tracing::debug!("Tool {} succeeded: {}", call.name, message.content);
            }
            results.push(message);
        }

        Ok(results)
    }

    /// Execute the calls of the last executor request.
    pub async fn run(&self, state: &SessionState) -> Result<StateUpdate, AgentError> {
        let messages = self.run_batch(pending_tool_calls(state)).await?;
        Ok(StateUpdate::new(AgentNode::Executor)
            .append_messages(messages.into_iter().map(ExecutorMessage::Tool).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedTools;
    use crate::tools::{ToolStatus, EXECUTOR_MESSAGES_KEY};
    use serde_json::{json, Map};

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "tap", Map::new())
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_calls() {
        let calls = vec![call("1"), call("2"), call("3")];
        let tools = ScriptedTools::new(vec![
            Ok(ToolOutput::Message(ToolMessage::success(&calls[0], "tapped"))),
            Ok(ToolOutput::Message(ToolMessage::error(&calls[1], "not found"))),
            Ok(ToolOutput::Message(ToolMessage::success(&calls[2], "tapped"))),
        ]);

        let results = ExecutorToolNode::new(&tools).run_batch(&calls).await.unwrap();

        let statuses: Vec<ToolStatus> = results.iter().map(|m| m.status).collect();
        assert_eq!(
            statuses,
            vec![ToolStatus::Success, ToolStatus::Error, ToolStatus::Error]
        );
        assert_eq!(results[2].content, ABORTED_MESSAGE);
        assert_eq!(results[2].tool_call_id, "3");
        assert_eq!(tools.executed_ids(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_all_calls_succeed() {
        let calls = vec![call("1"), call("2"), call("3")];
        let tools = ScriptedTools::new(
            calls
                .iter()
                .map(|c| Ok(ToolOutput::Message(ToolMessage::success(c, "ok"))))
                .collect(),
        );

        let results = ExecutorToolNode::new(&tools).run_batch(&calls).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|m| m.status == ToolStatus::Success));
        assert_eq!(tools.executed_ids(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_wrapped_update_and_unexpected_output() {
        let calls = vec![call("1"), call("2"), call("3")];
        let tools = ScriptedTools::new(vec![
            Ok(ToolOutput::Update(json!({
                EXECUTOR_MESSAGES_KEY: [
                    {"type": "tool", "tool_call_id": "1", "name": "tap",
                     "content": "tapped", "status": "success"}
                ]
            }))),
            Ok(ToolOutput::Raw(json!(42))),
            Ok(ToolOutput::Message(ToolMessage::success(&calls[2], "ok"))),
        ]);

        let results = ExecutorToolNode::new(&tools).run_batch(&calls).await.unwrap();

        assert_eq!(results[0].status, ToolStatus::Success);
        assert_eq!(results[1].content, "Unexpected tool output type: number");
        assert_eq!(results[2].content, ABORTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_executor_error_is_a_failed_call() {
        let calls = vec![call("1"), call("2")];
        let tools = ScriptedTools::new(vec![Err(anyhow::anyhow!("device offline"))]);

        let results = ExecutorToolNode::new(&tools).run_batch(&calls).await.unwrap();

        assert_eq!(results[0].content, "device offline");
        assert_eq!(results[1].content, ABORTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_malformed_update_is_contract_error() {
        let calls = vec![call("1")];
        let tools = ScriptedTools::new(vec![Ok(ToolOutput::Update(json!({
            EXECUTOR_MESSAGES_KEY: []
        })))]);

        let err = ExecutorToolNode::new(&tools).run_batch(&calls).await.unwrap_err();
        assert_eq!(err, ToolContractError::EmptyMessages(EXECUTOR_MESSAGES_KEY));
    }
}
