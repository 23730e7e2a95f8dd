//! Control loop configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of attempts for an LLM-backed step.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry, in seconds. Doubles on each retry.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Default ceiling on control loop steps for one task.
pub const DEFAULT_MAX_STEPS: u32 = 400;

/// Retry policy shared by every LLM-backed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Wait after the given failed attempt (1-based): base, 2*base, 4*base...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Configuration for a mobile automation run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of control loop steps before the task fails.
    pub max_steps: u32,
    /// Retry policy for planner, orchestrator, cortex and executor calls.
    pub retry: RetryPolicy,
    /// Where to write the thought log (JSON), rewritten after every step.
    pub thoughts_output_path: Option<PathBuf>,
    /// Where to write the final output.
    pub llm_output_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            retry: RetryPolicy::default(),
            thoughts_output_path: None,
            llm_output_path: None,
        }
    }
}

impl AgentConfig {
    /// Set the step ceiling.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Record the thought log to a file.
    pub fn with_thoughts_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.thoughts_output_path = Some(path.into());
        self
    }

    /// Record the final output to a file.
    pub fn with_llm_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.llm_output_path = Some(path.into());
        self
    }
}
