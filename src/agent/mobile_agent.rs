//! Task-level entry point: runs the control loop and packages the result.

use serde_json::Value;

use crate::task::{record_output, Task, TaskRequest, TaskResult, TaskStatus};

use super::control_loop::ControlLoop;
use super::error::AgentError;
use super::outputter::OutputterNode;

/// Runs goals on a mobile device.
pub struct MobileAgent {
    control_loop: ControlLoop,
}

impl MobileAgent {
    pub fn new(control_loop: ControlLoop) -> Self {
        Self { control_loop }
    }

    pub fn control_loop(&self) -> &ControlLoop {
        &self.control_loop
    }

    /// Run a goal to completion.
    ///
    /// # Returns
    /// The final content, or the error that ended the task.
    pub async fn run(&self, goal: &str) -> Result<Option<Value>, AgentError> {
        let outcome = self.control_loop.run(goal, None, None).await;
        match outcome.error {
            Some(e) => Err(e),
            None => {
                let outputter = OutputterNode::new(self.control_loop.llm());
                Ok(outputter
                    .run(&Default::default(), &outcome.state)
                    .await)
            }
        }
    }

    /// Run a task request and report its outcome.
    ///
    /// Never fails: errors are reported in the result.
    pub async fn run_task(&self, request: TaskRequest) -> TaskResult {
        let mut task = Task::new(&request);
        task.start();
        tracing::info!("Starting task {}: {}", task.name, task.goal);

        let outcome = self
            .control_loop
            .run(
                &request.goal,
                request.max_steps,
                request.thoughts_output_path.as_deref(),
            )
            .await;

        let (status, content, error) = if outcome.is_success() {
            let content = OutputterNode::new(self.control_loop.llm())
                .run(&request.output, &outcome.state)
                .await;
            (TaskStatus::Completed, content, None)
        } else {
            let error = outcome
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Task failed".to_string());
            (TaskStatus::Failed, None, Some(error))
        };

        let output_path = request
            .llm_output_path
            .as_ref()
            .or(self.control_loop.config().llm_output_path.as_ref());
        if let (Some(path), Some(content)) = (output_path, content.as_ref()) {
            if let Err(e) = record_output(path, content) {
                tracing::warn!("Failed to record output to {}: {}", path.display(), e);
            }
        }

        task.finalize(status);
        match status {
            TaskStatus::Completed => tracing::info!(
                "Task {} completed in {:.1}s ({} steps)",
                task.name,
                task.elapsed_seconds(),
                outcome.steps_taken
            ),
            _ => tracing::error!(
                "Task {} failed: {}",
                task.name,
                error.as_deref().unwrap_or_default()
            ),
        }

        TaskResult {
            task_id: task.id.clone(),
            status,
            content,
            error,
            thoughts: outcome.state.agents_thoughts,
            steps_taken: outcome.steps_taken,
            execution_time_seconds: task.elapsed_seconds(),
        }
    }
}
