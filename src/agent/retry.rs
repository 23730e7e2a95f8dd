//! Retry and fallback helpers for LLM-backed steps.

use std::fmt::Display;
use std::future::Future;

use serde_json::Value;

use crate::config::{AgentNode, RetryPolicy};
use crate::model::{invoke_structured, LlmError, LlmProvider, StructuredOutput};

/// Run `op` until it succeeds or the policy's attempts are exhausted.
///
/// `op` receives the 1-based attempt number. Waits `policy.delay_for(n)`
/// after failed attempt `n`; the last error is returned unchanged.
pub async fn with_retries<T, E, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    label,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("{} failed after {} attempts: {}", label, attempt, e);
                return Err(e);
            }
        }
    }
}

/// Invoke the agent's model and decode a `T`. An empty answer is an error.
pub async fn invoke_agent<T: StructuredOutput>(
    provider: &dyn LlmProvider,
    agent: AgentNode,
    messages: &[Value],
) -> Result<T, LlmError> {
    let llm = provider.llm(agent, false)?;
    invoke_structured::<T>(llm.as_ref(), messages)
        .await?
        .ok_or(LlmError::EmptyResponse)
}

/// Invoke the agent's primary model, then its fallback model if the primary
/// errors or returns nothing.
///
/// Without a fallback model the primary's failure is returned.
pub async fn invoke_with_fallback<T: StructuredOutput>(
    provider: &dyn LlmProvider,
    agent: AgentNode,
    messages: &[Value],
) -> Result<T, LlmError> {
    let primary = async {
        let llm = provider.llm(agent, false)?;
        invoke_structured::<T>(llm.as_ref(), messages).await
    };
    let primary_error = match primary.await {
        Ok(Some(value)) => return Ok(value),
        Ok(None) => {
            tracing::warn!("{} primary model returned nothing, using fallback", agent);
            LlmError::EmptyResponse
        }
        Err(e) => {
            tracing::warn!("{} primary model failed: {}, using fallback", agent, e);
            e
        }
    };

    let fallback = match provider.llm(agent, true) {
        Ok(fallback) => fallback,
        Err(e) => {
            tracing::warn!("{} fallback model unavailable: {}", agent, e);
            return Err(primary_error);
        }
    };
    invoke_structured::<T>(fallback.as_ref(), messages)
        .await?
        .ok_or(LlmError::EmptyResponse)
}
