//! Collaborators shared by the LLM-backed steps.

use crate::config::{render_system_prompt, RetryPolicy};
use crate::device::DeviceContext;
use crate::model::LlmProvider;
use crate::tools::ToolSpec;

/// What every LLM-backed step needs besides the session state.
#[derive(Clone, Copy)]
pub struct AgentContext<'a> {
    pub llm: &'a dyn LlmProvider,
    pub retry: &'a RetryPolicy,
    pub device: &'a DeviceContext,
    pub tools: &'a [ToolSpec],
}

impl<'a> AgentContext<'a> {
    /// Render a system prompt for the controlled device and its tools.
    pub fn system_prompt(&self, template: &str) -> String {
        render_system_prompt(
            template,
            self.device.platform.as_str(),
            &self.tools_summary(),
        )
    }

    /// `name: description` for each tool, comma separated.
    pub fn tools_summary(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
