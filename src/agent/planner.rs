//! Planner: decomposes the goal into an ordered list of subgoals.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::{AgentNode, PLANNER_SYSTEM_PROMPT};
use crate::model::{MessageBuilder, StructuredOutput};

use super::context::AgentContext;
use super::error::AgentError;
use super::retry::{invoke_agent, with_retries};
use super::state::{SessionState, StateUpdate};
use super::subgoal::{Subgoal, SubgoalPlan};

/// Whether the planner starts from scratch or repairs a failed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerAction {
    Plan,
    Replan,
}

impl PlannerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Replan => "replan",
        }
    }
}

/// A subgoal as proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSubgoal {
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
}

/// Structured answer of the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub subgoals: Vec<PlannedSubgoal>,
}

impl PlannerOutput {
    /// Fresh plan; every subgoal starts as not started.
    pub fn into_plan(self) -> SubgoalPlan {
        SubgoalPlan::new(
            self.subgoals
                .into_iter()
                .map(|planned| {
                    let id = planned
                        .id
                        .filter(|id| !id.trim().is_empty())
                        .unwrap_or_else(|| Uuid::new_v4().to_string());
                    Subgoal::new(id, planned.description)
                })
                .collect(),
        )
    }
}

impl StructuredOutput for PlannerOutput {
    const NAME: &'static str = "PlannerOutput";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "subgoals": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "description": {"type": "string"}
                        },
                        "required": ["description"]
                    }
                }
            },
            "required": ["subgoals"]
        })
    }
}

pub struct PlannerNode<'a> {
    ctx: AgentContext<'a>,
}

impl<'a> PlannerNode<'a> {
    pub fn new(ctx: AgentContext<'a>) -> Self {
        Self { ctx }
    }

    /// Produce a new plan, replacing the current one.
    pub async fn run(&self, state: &SessionState) -> Result<StateUpdate, AgentError> {
        let action = if state.subgoal_plan.any_failed() {
            PlannerAction::Replan
        } else {
            PlannerAction::Plan
        };
        tracing::info!("Planner action: {}", action.as_str());

        let messages = self.build_messages(state, action);
        let output: PlannerOutput = with_retries("Planner", self.ctx.retry, |_| {
            invoke_agent::<PlannerOutput>(self.ctx.llm, AgentNode::Planner, &messages)
        })
        .await
        .map_err(|e| AgentError::llm(AgentNode::Planner, e))?;

        let plan = output.into_plan();
        tracing::info!("Planner produced {} subgoal(s)", plan.len());

        Ok(StateUpdate::new(AgentNode::Planner)
            .with_thought(format!("Here is the plan:\n{}", plan))
            .with_plan(plan))
    }

    fn build_messages(&self, state: &SessionState, action: PlannerAction) -> Vec<Value> {
        let text = format!(
            "Action: {}\n\nGoal: {}\n\nPrevious plan:\n{}\n\nThoughts so far:\n{}",
            action.as_str(),
            state.initial_goal,
            state.subgoal_plan,
            state.thoughts_text()
        );
        vec![
            MessageBuilder::create_system_message(&self.ctx.system_prompt(PLANNER_SYSTEM_PROMPT)),
            MessageBuilder::create_user_message(&text, None),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::subgoal::SubgoalStatus;
    use crate::agent::testing::{ScriptedLlm, ScriptedProvider};
    use crate::config::RetryPolicy;
    use crate::device::{DeviceContext, DevicePlatform};
    use std::time::Duration;
    use tokio::time::Instant;

    fn plan_answer() -> Value {
        json!({
            "subgoals": [
                {"id": "open", "description": "Open the settings app"},
                {"description": "Turn on wifi"}
            ]
        })
    }

    #[test]
    fn test_into_plan_fills_missing_ids() {
        let output: PlannerOutput = serde_json::from_value(plan_answer()).unwrap();
        let plan = output.into_plan();

        assert_eq!(plan.items()[0].id, "open");
        assert!(Uuid::parse_str(&plan.items()[1].id).is_ok());
        assert!(plan
            .items()
            .iter()
            .all(|s| s.status == SubgoalStatus::NotStarted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let llm = ScriptedLlm::new(vec![
            Err("timeout".into()),
            Err("overloaded".into()),
            Ok(Some(plan_answer())),
        ]);
        let provider = ScriptedProvider::new().with(AgentNode::Planner, llm.clone());
        let retry = RetryPolicy::default();
        let device = DeviceContext::new("d", DevicePlatform::Android, 1080, 2400);
        let node = PlannerNode::new(AgentContext {
            llm: &provider,
            retry: &retry,
            device: &device,
            tools: &[],
        });

        let started = Instant::now();
        let update = node.run(&SessionState::new("Turn on wifi", 10)).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(llm.call_count(), 3);
        assert_eq!(update.subgoal_plan.map(|p| p.len()), Some(2));
    }

    #[tokio::test]
    async fn test_replan_after_failure() {
        let llm = ScriptedLlm::answering(vec![plan_answer()]);
        let provider = ScriptedProvider::new().with(AgentNode::Planner, llm.clone());
        let retry = RetryPolicy::default();
        let device = DeviceContext::new("d", DevicePlatform::Android, 1080, 2400);
        let node = PlannerNode::new(AgentContext {
            llm: &provider,
            retry: &retry,
            device: &device,
            tools: &[],
        });
        let mut state = SessionState::new("Turn on wifi", 10);
        state.subgoal_plan =
            SubgoalPlan::new(vec![Subgoal::new("x", "Old").with_status(SubgoalStatus::Failure)]);

        let update = node.run(&state).await.unwrap();
        state.apply(update);

        let prompt = MessageBuilder::text_of(&llm.calls()[0][1]);
        assert!(prompt.starts_with("Action: replan"));
        assert!(prompt.contains("- [ID:x]: Old : ❌."));
        assert!(!state.subgoal_plan.any_failed());
        assert!(state.agents_thoughts[0].starts_with("[planner] Here is the plan:"));
    }
}
