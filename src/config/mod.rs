//! Configuration module for the mobile-use agents.

mod agent;
mod llm;
mod prompts;

pub use agent::{
    AgentConfig, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_STEPS, DEFAULT_RETRY_DELAY_SECS,
};
pub use llm::{AgentNode, LlmConfig, LlmSpec, LlmWithFallback};
pub use prompts::{
    render_system_prompt, CORTEX_SYSTEM_PROMPT, EXECUTOR_SYSTEM_PROMPT,
    ORCHESTRATOR_SYSTEM_PROMPT, OUTPUTTER_SYSTEM_PROMPT, PLANNER_SYSTEM_PROMPT,
};
