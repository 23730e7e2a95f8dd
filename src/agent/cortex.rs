//! Cortex: decides the next UI actions or reports completed subgoals.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{AgentNode, CORTEX_SYSTEM_PROMPT};
use crate::model::{MessageBuilder, StructuredOutput};

use super::context::AgentContext;
use super::error::AgentError;
use super::retry::{invoke_with_fallback, with_retries};
use super::state::{SessionState, StateUpdate};

/// Decision payloads that mean "nothing to do".
const EMPTY_DECISIONS: [&str; 4] = ["{}", "[]", "null", "\"\""];

/// Structured answer of the cortex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CortexOutput {
    /// UI actions for the executor, as a JSON string.
    #[serde(default)]
    pub decisions: Option<String>,
    pub agent_thought: String,
    #[serde(default)]
    pub complete_subgoals_by_ids: Option<Vec<String>>,
}

impl CortexOutput {
    /// Whether the decisions carry no action.
    pub fn has_no_decisions(&self) -> bool {
        match self.decisions.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(decisions) => EMPTY_DECISIONS.contains(&decisions),
        }
    }

    /// A completion-only turn reports completed subgoals and runs no tools.
    pub fn is_completion_only(&self) -> bool {
        let has_completions = self
            .complete_subgoals_by_ids
            .as_ref()
            .is_some_and(|ids| !ids.is_empty());
        has_completions && self.has_no_decisions()
    }
}

impl StructuredOutput for CortexOutput {
    const NAME: &'static str = "CortexOutput";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "decisions": {
                    "type": "string",
                    "description": "JSON-encoded UI actions for the executor, empty when only reporting completions"
                },
                "agent_thought": {"type": "string"},
                "complete_subgoals_by_ids": {
                    "type": ["array", "null"],
                    "items": {"type": "string"}
                }
            },
            "required": ["decisions", "agent_thought"]
        })
    }
}

pub struct CortexNode<'a> {
    ctx: AgentContext<'a>,
}

impl<'a> CortexNode<'a> {
    pub fn new(ctx: AgentContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run one cortex turn.
    pub async fn run(&self, state: &SessionState) -> Result<StateUpdate, AgentError> {
        let messages = self.build_messages(state);
        let output: CortexOutput = with_retries("Cortex", self.ctx.retry, |_| {
            invoke_with_fallback::<CortexOutput>(self.ctx.llm, AgentNode::Cortex, &messages)
        })
        .await
        .map_err(|e| AgentError::llm(AgentNode::Cortex, e))?;

        Ok(Self::state_update(output))
    }

    /// Turn the cortex answer into a state update.
    ///
    /// Observations are consumed and the executor transcript of the previous
    /// turn is dropped.
    pub fn state_update(output: CortexOutput) -> StateUpdate {
        let update = StateUpdate::new(AgentNode::Cortex)
            .with_thought(&output.agent_thought)
            .clear_observations()
            .reset_messages()
            .with_cortex_last_thought(output.agent_thought.clone());

        if output.is_completion_only() {
            let ids = output.complete_subgoals_by_ids.unwrap_or_default();
            tracing::info!("Cortex reports completed subgoals: {:?}", ids);
            update.with_decisions(None).with_completed_ids(ids)
        } else {
            update
                .with_decisions(output.decisions.filter(|d| !d.trim().is_empty()))
                .with_completed_ids(Vec::new())
        }
    }

    fn build_messages(&self, state: &SessionState) -> Vec<Value> {
        let observations = &state.observations;
        let current = state
            .subgoal_plan
            .current()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "None".to_string());
        let hierarchy = observations
            .ui_hierarchy
            .as_ref()
            .and_then(|h| serde_json::to_string(h).ok())
            .unwrap_or_else(|| "Not available".to_string());

        let text = format!(
            "Goal: {}\n\nSubgoal plan:\n{}\n\nCurrent subgoal: {}\n\n{}\nFocused app: {}\nDevice date: {}\nRemaining steps: {}\n\nUI hierarchy:\n{}\n\n{}\n\nThoughts so far:\n{}",
            state.initial_goal,
            state.subgoal_plan,
            current,
            self.ctx.device.describe(),
            observations.focused_app_info.as_deref().unwrap_or("Unknown"),
            observations.device_date.as_deref().unwrap_or("Unknown"),
            state.remaining_steps,
            hierarchy,
            state.executor_feedback(),
            state.thoughts_text(),
        );

        vec![
            MessageBuilder::create_system_message(&self.ctx.system_prompt(CORTEX_SYSTEM_PROMPT)),
            MessageBuilder::create_user_message(&text, observations.screenshot.as_deref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{ScriptedLlm, ScriptedProvider};
    use crate::config::RetryPolicy;
    use crate::device::{DeviceContext, DevicePlatform};
    use crate::model::LlmError;

    fn output(decisions: &str, ids: &[&str]) -> CortexOutput {
        CortexOutput {
            decisions: Some(decisions.to_string()),
            agent_thought: "thinking".to_string(),
            complete_subgoals_by_ids: Some(ids.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_completion_only_turn() {
        let update = CortexNode::state_update(output("", &["a"]));
        assert_eq!(update.structured_decisions, Some(None));
        assert_eq!(update.complete_subgoals_by_ids, Some(vec!["a".to_string()]));

        for empty in ["{}", "[]", "null", "\"\"", "  "] {
            assert!(output(empty, &["a"]).is_completion_only(), "{}", empty);
        }
    }

    #[test]
    fn test_action_turn_drops_completions() {
        let update = CortexNode::state_update(output(r#"{"tap":"x"}"#, &["a"]));
        assert_eq!(
            update.structured_decisions,
            Some(Some(r#"{"tap":"x"}"#.to_string()))
        );
        assert_eq!(update.complete_subgoals_by_ids, Some(Vec::new()));
        assert_eq!(
            update.agents_thoughts,
            vec!["[cortex] thinking".to_string()]
        );
        assert_eq!(update.cortex_last_thought.as_deref(), Some("thinking"));
    }

    #[test]
    fn test_no_completions_is_action_turn() {
        assert!(!output("", &[]).is_completion_only());
        let missing = CortexOutput {
            decisions: None,
            agent_thought: "idle".into(),
            complete_subgoals_by_ids: None,
        };
        assert!(!missing.is_completion_only());
    }

    fn device() -> DeviceContext {
        DeviceContext::new("emulator-5554", DevicePlatform::Android, 1080, 2400)
    }

    #[tokio::test]
    async fn test_fallback_substitutes_primary() {
        let primary = ScriptedLlm::new(vec![Err("rate limited".into()), Ok(None)]);
        let fallback = ScriptedLlm::answering(vec![
            json!({"decisions": "{\"tap\": \"wifi\"}", "agent_thought": "tap wifi"}),
            json!({"decisions": "", "agent_thought": "done", "complete_subgoals_by_ids": ["1"]}),
        ]);
        let provider = ScriptedProvider::new()
            .with(AgentNode::Cortex, primary.clone())
            .with_fallback(AgentNode::Cortex, fallback.clone());
        let retry = RetryPolicy::default();
        let device = device();
        let ctx = AgentContext {
            llm: &provider,
            retry: &retry,
            device: &device,
            tools: &[],
        };
        let node = CortexNode::new(ctx);
        let state = SessionState::new("Turn on wifi", 10);

        let first = node.run(&state).await.unwrap();
        assert_eq!(first.cortex_last_thought.as_deref(), Some("tap wifi"));
        let second = node.run(&state).await.unwrap();
        assert_eq!(second.complete_subgoals_by_ids, Some(vec!["1".to_string()]));

        assert_eq!(primary.call_count(), 2);
        assert_eq!(fallback.call_count(), 2);
        let prompt = MessageBuilder::text_of(&fallback.calls()[0][1]);
        assert!(prompt.contains("Remaining steps: 10"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_retries() {
        let provider = ScriptedProvider::new()
            .with(AgentNode::Cortex, ScriptedLlm::new(Vec::new()))
            .with_fallback(AgentNode::Cortex, ScriptedLlm::new(Vec::new()));
        let retry = RetryPolicy::default();
        let device = device();
        let ctx = AgentContext {
            llm: &provider,
            retry: &retry,
            device: &device,
            tools: &[],
        };

        let err = CortexNode::new(ctx)
            .run(&SessionState::new("goal", 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::Llm {
                agent: AgentNode::Cortex,
                source: LlmError::RequestFailed(_)
            }
        ));
    }
}
