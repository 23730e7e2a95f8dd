//! Agents of the mobile automation control loop.

mod context;
mod contextor;
mod control_loop;
mod cortex;
mod error;
mod executor;
mod mobile_agent;
mod orchestrator;
mod outputter;
mod planner;
pub mod retry;
mod state;
mod subgoal;
mod tool_node;

#[cfg(test)]
mod testing;

pub use context::AgentContext;
pub use contextor::ContextorNode;
pub use control_loop::{
    after_cortex, after_orchestrator, ControlLoop, ControlLoopBuilder, LoopOutcome, LoopState,
    ThoughtCallback,
};
pub use cortex::{CortexNode, CortexOutput};
pub use error::AgentError;
pub use executor::{
    pending_tool_calls, ExecutorNode, ExecutorOutput, RequestedToolCall, NO_DECISIONS_THOUGHT,
};
pub use mobile_agent::MobileAgent;
pub use orchestrator::{
    OrchestratorNode, OrchestratorOutput, NOTHING_TO_EXAMINE_THOUGHT, PLAN_COMPLETED_THOUGHT,
    REPLANNING_THOUGHT,
};
pub use outputter::{OutputConfig, OutputterNode};
pub use planner::{PlannedSubgoal, PlannerAction, PlannerNode, PlannerOutput};
pub use state::{Observations, SessionState, StateUpdate, TranscriptUpdate};
pub use subgoal::{Subgoal, SubgoalPlan, SubgoalStats, SubgoalStatus};
pub use tool_node::{ExecutorToolNode, ABORTED_MESSAGE};
