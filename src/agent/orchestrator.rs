//! Orchestrator: advances the subgoal ledger.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{AgentNode, ORCHESTRATOR_SYSTEM_PROMPT};
use crate::model::{MessageBuilder, StructuredOutput};

use super::context::AgentContext;
use super::error::AgentError;
use super::retry::{invoke_agent, with_retries};
use super::state::{SessionState, StateUpdate};
use super::subgoal::{Subgoal, SubgoalPlan};

pub const REPLANNING_THOUGHT: &str = "==== END OF PLAN, REPLANNING ====";
pub const NOTHING_TO_EXAMINE_THOUGHT: &str = "No subgoal to examine.";
pub const PLAN_COMPLETED_THOUGHT: &str = "All the subgoals have been completed successfully.";

/// Structured answer of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorOutput {
    pub needs_replaning: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub completed_subgoal_ids: Vec<String>,
}

impl StructuredOutput for OrchestratorOutput {
    const NAME: &'static str = "OrchestratorOutput";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "needs_replaning": {"type": "boolean"},
                "reason": {"type": "string"},
                "completed_subgoal_ids": {
                    "type": "array",
                    "items": {"type": "string"}
                }
            },
            "required": ["needs_replaning", "reason"]
        })
    }
}

pub struct OrchestratorNode<'a> {
    ctx: AgentContext<'a>,
}

impl<'a> OrchestratorNode<'a> {
    pub fn new(ctx: AgentContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run one orchestrator turn.
    ///
    /// Every outcome resets the completion buffer.
    pub async fn run(&self, state: &SessionState) -> Result<StateUpdate, AgentError> {
        let mut plan = state.subgoal_plan.clone();
        let update = StateUpdate::new(AgentNode::Orchestrator).with_completed_ids(Vec::new());

        if plan.nothing_started() || plan.current().is_none() {
            let first = plan.nothing_started();
            let started = plan.start_next().map(Subgoal::to_string);
            let update = match started {
                Some(subgoal) if first => {
                    update.with_thought(format!("Starting the first subgoal: {}", subgoal))
                }
                Some(subgoal) => {
                    update.with_thought(format!("Starting the next subgoal: {}", subgoal))
                }
                None => update,
            };
            return Ok(update.with_plan(plan));
        }

        let examined = plan.by_ids(&state.complete_subgoals_by_ids);
        if examined.is_empty() {
            return Ok(update.with_thought(NOTHING_TO_EXAMINE_THOUGHT));
        }

        let messages = self.build_messages(state, &plan, &examined);
        let output: OrchestratorOutput = with_retries("Orchestrator", self.ctx.retry, |_| {
            invoke_agent::<OrchestratorOutput>(self.ctx.llm, AgentNode::Orchestrator, &messages)
        })
        .await
        .map_err(|e| AgentError::llm(AgentNode::Orchestrator, e))?;

        Ok(Self::apply_decision(plan, output, update))
    }

    fn apply_decision(
        mut plan: SubgoalPlan,
        output: OrchestratorOutput,
        update: StateUpdate,
    ) -> StateUpdate {
        if output.needs_replaning {
            tracing::warn!("Orchestrator requests replanning: {}", output.reason);
            plan.set_current_reason(&output.reason);
            plan.fail_current();
            return update
                .with_thought(&output.reason)
                .with_thought(REPLANNING_THOUGHT)
                .with_plan(plan);
        }

        let current_id = plan.current().map(|s| s.id.clone());
        let current_completed = current_id
            .as_ref()
            .is_some_and(|id| output.completed_subgoal_ids.contains(id));
        if current_completed && !output.reason.is_empty() {
            plan.set_current_reason(&output.reason);
        }
        plan.complete_by_ids(&output.completed_subgoal_ids);

        let update = if output.reason.is_empty() {
            update
        } else {
            update.with_thought(&output.reason)
        };
        if plan.all_completed() {
            tracing::info!("{}", PLAN_COMPLETED_THOUGHT);
            return update.with_thought(PLAN_COMPLETED_THOUGHT).with_plan(plan);
        }
        if !current_completed {
            tracing::info!("Current subgoal is not complete yet: {}", output.reason);
            return update.with_plan(plan);
        }

        let update = match plan.start_next().map(Subgoal::to_string) {
            Some(subgoal) => update.with_thought(format!("==== NEXT SUBGOAL: {} ====", subgoal)),
            None => update,
        };
        update.with_plan(plan)
    }

    fn build_messages(
        &self,
        state: &SessionState,
        plan: &SubgoalPlan,
        examined: &[&Subgoal],
    ) -> Vec<Value> {
        let examined = examined
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!(
            "Goal: {}\n\nSubgoal plan:\n{}\n\nSubgoals to examine:\n{}\n\nThoughts so far:\n{}",
            state.initial_goal,
            plan,
            examined,
            state.thoughts_text()
        );
        vec![
            MessageBuilder::create_system_message(
                &self.ctx.system_prompt(ORCHESTRATOR_SYSTEM_PROMPT),
            ),
            MessageBuilder::create_user_message(&text, None),
        ]
    }
}
