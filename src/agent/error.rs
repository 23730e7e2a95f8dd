//! Errors raised by the control loop.

use thiserror::Error;

use crate::config::AgentNode;
use crate::model::LlmError;
use crate::tools::ToolContractError;

/// Agent errors.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{agent} LLM call failed: {source}")]
    Llm {
        agent: AgentNode,
        #[source]
        source: LlmError,
    },
    #[error("Device observation failed: {0}")]
    Observation(String),
    #[error("Tool contract violated: {0}")]
    ToolContract(#[from] ToolContractError),
    #[error("max steps ({0}) reached")]
    MaxStepsReached(u32),
}

impl AgentError {
    pub fn llm(agent: AgentNode, source: LlmError) -> Self {
        Self::Llm { agent, source }
    }
}
