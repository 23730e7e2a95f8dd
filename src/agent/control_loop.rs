//! Plan/decide/execute control loop.
//!
//! The loop is an explicit state machine. Each visit to a state runs one
//! step, merges its updates into the session state and picks the next state
//! from the ledger:
//!
//! ```text
//! Planning -> Orchestrating -> Deciding -> Executing -> Deciding ...
//!                  ^    |           |
//!                  |    +-> Done    |
//!                  +----------------+ (subgoals reported complete)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::device::DeviceObserver;
use crate::model::LlmProvider;
use crate::task::record_events;
use crate::tools::ToolExecutor;

use super::context::AgentContext;
use super::contextor::ContextorNode;
use super::cortex::CortexNode;
use super::error::AgentError;
use super::executor::{pending_tool_calls, ExecutorNode};
use super::orchestrator::OrchestratorNode;
use super::planner::PlannerNode;
use super::state::{SessionState, StateUpdate};
use super::subgoal::SubgoalPlan;
use super::tool_node::ExecutorToolNode;

/// Callback invoked for every new thought.
pub type ThoughtCallback = Box<dyn Fn(&str) + Send + Sync>;

/// States of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Planning,
    Orchestrating,
    Deciding,
    Executing,
    Done,
    Failed,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planner",
            Self::Orchestrating => "orchestrator",
            Self::Deciding => "cortex",
            Self::Executing => "executor",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Next state after an orchestrator turn.
pub fn after_orchestrator(plan: &SubgoalPlan) -> LoopState {
    if plan.any_failed() {
        LoopState::Planning
    } else if plan.all_completed() || plan.current().is_none() {
        LoopState::Done
    } else {
        LoopState::Deciding
    }
}

/// Next state after a cortex turn.
pub fn after_cortex(state: &SessionState) -> LoopState {
    if state.complete_subgoals_by_ids.is_empty() {
        LoopState::Executing
    } else {
        LoopState::Orchestrating
    }
}

/// How a loop run ended.
#[derive(Debug)]
pub struct LoopOutcome {
    /// `Done` or `Failed`.
    pub status: LoopState,
    pub error: Option<AgentError>,
    pub state: SessionState,
    pub steps_taken: u32,
}

impl LoopOutcome {
    pub fn is_success(&self) -> bool {
        self.status == LoopState::Done
    }
}

/// Drives the agents for one goal at a time.
pub struct ControlLoop {
    llm: Arc<dyn LlmProvider>,
    device: Arc<dyn DeviceObserver>,
    tools: Arc<dyn ToolExecutor>,
    config: AgentConfig,
    thought_callback: Option<ThoughtCallback>,
}

impl ControlLoop {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        device: Arc<dyn DeviceObserver>,
        tools: Arc<dyn ToolExecutor>,
        config: AgentConfig,
    ) -> Self {
        Self {
            llm,
            device,
            tools,
            config,
            thought_callback: None,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn llm(&self) -> &dyn LlmProvider {
        self.llm.as_ref()
    }

    /// Run the loop until the plan completes, a step fails or the step
    /// ceiling is hit.
    ///
    /// `max_steps` and `thoughts_path` override the configured values.
    pub async fn run(
        &self,
        goal: &str,
        max_steps: Option<u32>,
        thoughts_path: Option<&Path>,
    ) -> LoopOutcome {
        let max_steps = max_steps.unwrap_or(self.config.max_steps);
        let thoughts_path: Option<PathBuf> = thoughts_path
            .map(Path::to_path_buf)
            .or_else(|| self.config.thoughts_output_path.clone());

        let tool_specs = self.tools.tool_specs();
        let ctx = AgentContext {
            llm: self.llm.as_ref(),
            retry: &self.config.retry,
            device: self.device.device(),
            tools: &tool_specs,
        };

        let mut state = SessionState::new(goal, max_steps);
        let mut current = LoopState::Planning;
        let mut steps = 0;
        let mut error = None;

        tracing::info!("Starting task: {}", goal);

        while !current.is_terminal() {
            if steps >= max_steps {
                tracing::error!("Max steps ({}) reached", max_steps);
                error = Some(AgentError::MaxStepsReached(max_steps));
                current = LoopState::Failed;
                break;
            }
            steps += 1;
            state.remaining_steps = max_steps - steps;

            let seen = state.agents_thoughts.len();
            tracing::info!(
                "Starting {} (step {}/{})",
                current.as_str(),
                steps,
                max_steps
            );
            let result = self.step(current, ctx, &mut state).await;
            self.report_thoughts(&state.agents_thoughts[seen..]);

            if let Some(path) = &thoughts_path {
                if let Err(e) = record_events(path, &state.agents_thoughts) {
                    tracing::warn!("Failed to record thoughts to {}: {}", path.display(), e);
                }
            }

            match result {
                Ok(next) => {
                    tracing::info!("{} succeeded, next: {:?}", current.as_str(), next);
                    current = next;
                }
                Err(e) => {
                    tracing::error!("{} failed: {}", current.as_str(), e);
                    error = Some(e);
                    current = LoopState::Failed;
                }
            }
        }

        if current == LoopState::Done {
            tracing::info!("Task completed in {} steps", steps);
        }

        LoopOutcome {
            status: current,
            error,
            state,
            steps_taken: steps,
        }
    }

    /// Run the step of `current` and return the next state.
    async fn step(
        &self,
        current: LoopState,
        ctx: AgentContext<'_>,
        state: &mut SessionState,
    ) -> Result<LoopState, AgentError> {
        match current {
            LoopState::Planning => {
                let update = PlannerNode::new(ctx).run(state).await?;
                apply(state, update);
                Ok(LoopState::Orchestrating)
            }
            LoopState::Orchestrating => {
                let update = OrchestratorNode::new(ctx).run(state).await?;
                apply(state, update);
                Ok(after_orchestrator(&state.subgoal_plan))
            }
            LoopState::Deciding => {
                let update = ContextorNode::new(self.device.as_ref()).run(state).await?;
                apply(state, update);
                let update = CortexNode::new(ctx).run(state).await?;
                apply(state, update);
                Ok(after_cortex(state))
            }
            LoopState::Executing => {
                let update = ExecutorNode::new(ctx).run(state).await?;
                apply(state, update);
                if !pending_tool_calls(state).is_empty() {
                    let update = ExecutorToolNode::new(self.tools.as_ref()).run(state).await?;
                    apply(state, update);
                }
                Ok(LoopState::Deciding)
            }
            LoopState::Done | LoopState::Failed => Ok(current),
        }
    }

    fn report_thoughts(&self, thoughts: &[String]) {
        for thought in thoughts {
            tracing::debug!("{}", thought);
            if let Some(ref callback) = self.thought_callback {
                callback(thought);
            }
        }
    }
}

fn apply(state: &mut SessionState, update: StateUpdate) {
    tracing::debug!("Applying {} update", update.agent());
    state.apply(update);
}

/// Builder for creating a control loop.
pub struct ControlLoopBuilder {
    llm: Option<Arc<dyn LlmProvider>>,
    device: Option<Arc<dyn DeviceObserver>>,
    tools: Option<Arc<dyn ToolExecutor>>,
    config: AgentConfig,
    thought_callback: Option<ThoughtCallback>,
}

impl ControlLoopBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            llm: None,
            device: None,
            tools: None,
            config: AgentConfig::default(),
            thought_callback: None,
        }
    }

    /// Set the LLM provider.
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the device observer.
    pub fn with_device(mut self, device: Arc<dyn DeviceObserver>) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the tool executor.
    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the step ceiling.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    /// Set a callback receiving every new thought.
    pub fn with_thought_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.thought_callback = Some(Box::new(callback));
        self
    }

    /// Build the control loop.
    pub fn build(self) -> Result<ControlLoop, &'static str> {
        let llm = self.llm.ok_or("LLM provider is required")?;
        let device = self.device.ok_or("Device observer is required")?;
        let tools = self.tools.ok_or("Tool executor is required")?;
        let mut control_loop = ControlLoop::new(llm, device, tools, self.config);
        control_loop.thought_callback = self.thought_callback;
        Ok(control_loop)
    }
}

impl Default for ControlLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
