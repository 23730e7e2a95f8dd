//! Session state shared by the control loop steps.
//!
//! Steps never mutate the state directly: each one reads `&SessionState` and
//! returns a [`StateUpdate`], which the control loop merges with
//! [`SessionState::apply`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AgentNode;
use crate::tools::{ExecutorMessage, ToolMessage};

use super::subgoal::SubgoalPlan;

/// Device observations collected for one cortex turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    /// Base64-encoded screenshot, only when explicitly requested.
    pub screenshot: Option<String>,
    pub ui_hierarchy: Option<Vec<Value>>,
    pub focused_app_info: Option<String>,
    pub device_date: Option<String>,
}

/// Change to the executor transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptUpdate {
    Append(Vec<ExecutorMessage>),
    Reset,
}

/// State of one task run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub initial_goal: String,
    pub subgoal_plan: SubgoalPlan,
    /// Append-only thought log, each entry prefixed `[<agent>] `.
    pub agents_thoughts: Vec<String>,
    pub observations: Observations,
    /// Latest UI decisions from the cortex.
    pub structured_decisions: Option<String>,
    /// Subgoals the cortex reports as complete, awaiting the orchestrator.
    pub complete_subgoals_by_ids: Vec<String>,
    /// Executor transcript of the current cortex turn.
    pub executor_messages: Vec<ExecutorMessage>,
    pub cortex_last_thought: Option<String>,
    /// Steps left before the loop gives up, shown to the cortex.
    pub remaining_steps: u32,
}

impl SessionState {
    pub fn new(initial_goal: impl Into<String>, max_steps: u32) -> Self {
        Self {
            initial_goal: initial_goal.into(),
            remaining_steps: max_steps,
            ..Default::default()
        }
    }

    /// Merge a partial update.
    ///
    /// Thoughts append; every other present field replaces the current value.
    pub fn apply(&mut self, update: StateUpdate) {
        self.agents_thoughts.extend(update.agents_thoughts);
        if let Some(plan) = update.subgoal_plan {
            self.subgoal_plan = plan;
        }
        if let Some(observations) = update.observations {
            self.observations = observations;
        }
        if let Some(decisions) = update.structured_decisions {
            self.structured_decisions = decisions;
        }
        if let Some(ids) = update.complete_subgoals_by_ids {
            self.complete_subgoals_by_ids = ids;
        }
        match update.executor_messages {
            Some(TranscriptUpdate::Append(messages)) => self.executor_messages.extend(messages),
            Some(TranscriptUpdate::Reset) => self.executor_messages.clear(),
            None => {}
        }
        if let Some(thought) = update.cortex_last_thought {
            self.cortex_last_thought = Some(thought);
        }
    }

    /// Last entry of the thought log.
    pub fn last_thought(&self) -> Option<&str> {
        self.agents_thoughts.last().map(String::as_str)
    }

    /// Tool messages of the current executor transcript, in order.
    pub fn tool_messages(&self) -> impl Iterator<Item = &ToolMessage> {
        self.executor_messages
            .iter()
            .filter_map(ExecutorMessage::as_tool_message)
    }

    /// Most recent tool message of the current transcript.
    pub fn last_tool_message(&self) -> Option<&ToolMessage> {
        self.tool_messages().last()
    }

    /// Check if the most recent tool message came from `tool_name`.
    pub fn last_tool_message_is(&self, tool_name: &str) -> bool {
        self.last_tool_message()
            .is_some_and(|message| message.name == tool_name)
    }

    /// Feedback for the cortex: previous decisions and what the tools said.
    pub fn executor_feedback(&self) -> String {
        let decisions = match self.structured_decisions.as_deref() {
            Some(decisions) if !decisions.trim().is_empty() => decisions,
            _ => return "None.".to_string(),
        };
        let feedback: Vec<String> = self
            .tool_messages()
            .map(|message| {
                format!(
                    "- {} [{}]: {}",
                    message.name,
                    if message.is_error() { "error" } else { "success" },
                    message.content
                )
            })
            .collect();
        let feedback = if feedback.is_empty() {
            "None.".to_string()
        } else {
            feedback.join("\n")
        };
        format!(
            "Latest UI decisions:\n{}\n\nExecutor feedback:\n{}",
            decisions, feedback
        )
    }

    /// The thought log as one newline-separated string.
    pub fn thoughts_text(&self) -> String {
        self.agents_thoughts.join("\n")
    }
}

/// Partial state update returned by a step.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    agent: AgentNode,
    pub agents_thoughts: Vec<String>,
    pub subgoal_plan: Option<SubgoalPlan>,
    pub observations: Option<Observations>,
    pub structured_decisions: Option<Option<String>>,
    pub complete_subgoals_by_ids: Option<Vec<String>>,
    pub executor_messages: Option<TranscriptUpdate>,
    pub cortex_last_thought: Option<String>,
}

impl StateUpdate {
    /// Empty update emitted by `agent`.
    pub fn new(agent: AgentNode) -> Self {
        Self {
            agent,
            agents_thoughts: Vec::new(),
            subgoal_plan: None,
            observations: None,
            structured_decisions: None,
            complete_subgoals_by_ids: None,
            executor_messages: None,
            cortex_last_thought: None,
        }
    }

    pub fn agent(&self) -> AgentNode {
        self.agent
    }

    /// Append a thought, tagged with the emitting agent.
    pub fn with_thought(mut self, thought: impl AsRef<str>) -> Self {
        self.agents_thoughts
            .push(format!("[{}] {}", self.agent, thought.as_ref()));
        self
    }

    pub fn with_plan(mut self, plan: SubgoalPlan) -> Self {
        self.subgoal_plan = Some(plan);
        self
    }

    pub fn with_observations(mut self, observations: Observations) -> Self {
        self.observations = Some(observations);
        self
    }

    /// Clear every observation field.
    pub fn clear_observations(self) -> Self {
        self.with_observations(Observations::default())
    }

    pub fn with_decisions(mut self, decisions: Option<String>) -> Self {
        self.structured_decisions = Some(decisions);
        self
    }

    pub fn with_completed_ids(mut self, ids: Vec<String>) -> Self {
        self.complete_subgoals_by_ids = Some(ids);
        self
    }

    pub fn append_messages(mut self, messages: Vec<ExecutorMessage>) -> Self {
        self.executor_messages = Some(TranscriptUpdate::Append(messages));
        self
    }

    pub fn reset_messages(mut self) -> Self {
        self.executor_messages = Some(TranscriptUpdate::Reset);
        self
    }

    pub fn with_cortex_last_thought(mut self, thought: impl Into<String>) -> Self {
        self.cortex_last_thought = Some(thought.into());
        self
    }
}
