//! Per-agent LLM selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nodes of the control loop that either call an LLM or tag thoughts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentNode {
    Planner,
    Orchestrator,
    Contextor,
    Cortex,
    Executor,
    Outputter,
}

impl AgentNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Orchestrator => "orchestrator",
            Self::Contextor => "contextor",
            Self::Cortex => "cortex",
            Self::Executor => "executor",
            Self::Outputter => "outputter",
        }
    }
}

impl fmt::Display for AgentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider/model pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSpec {
    pub provider: String,
    pub model: String,
}

impl LlmSpec {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for LlmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// A provider/model pair with a secondary model used when the primary fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmWithFallback {
    pub provider: String,
    pub model: String,
    pub fallback: LlmSpec,
}

impl fmt::Display for LlmWithFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (fallback: {})",
            self.provider, self.model, self.fallback
        )
    }
}

/// Which model each agent talks to.
///
/// Only the cortex carries a fallback model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub planner: LlmSpec,
    pub orchestrator: LlmSpec,
    pub cortex: LlmWithFallback,
    pub executor: LlmSpec,
    pub outputter: LlmSpec,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            planner: LlmSpec::new("openai", "gpt-4.1"),
            orchestrator: LlmSpec::new("openai", "gpt-4.1"),
            cortex: LlmWithFallback {
                provider: "openai".to_string(),
                model: "o3".to_string(),
                fallback: LlmSpec::new("openai", "gpt-5"),
            },
            executor: LlmSpec::new("openai", "gpt-4.1"),
            outputter: LlmSpec::new("openai", "gpt-5-nano"),
        }
    }
}

impl fmt::Display for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Planner: {}", self.planner)?;
        writeln!(f, "Orchestrator: {}", self.orchestrator)?;
        writeln!(f, "Cortex: {}", self.cortex)?;
        writeln!(f, "Executor: {}", self.executor)?;
        write!(f, "Outputter: {}", self.outputter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_partial_json() {
        let json = r#"{
            "planner": {"provider": "openrouter", "model": "meta-llama/llama-4"},
            "orchestrator": {"provider": "openai", "model": "gpt-4.1"},
            "cortex": {"provider": "google", "model": "gemini-2.5-pro",
                       "fallback": {"provider": "openai", "model": "gpt-5"}},
            "executor": {"provider": "openai", "model": "gpt-4.1"},
            "outputter": {"provider": "openai", "model": "gpt-5-nano"}
        }"#;
        let config: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.planner.to_string(), "openrouter/meta-llama/llama-4");
        assert_eq!(
            config.cortex.to_string(),
            "google/gemini-2.5-pro (fallback: openai/gpt-5)"
        );
        assert!(config
            .to_string()
            .starts_with("Planner: openrouter/meta-llama/llama-4\nOrchestrator: openai/gpt-4.1"));
    }
}
