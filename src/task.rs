//! Task requests, task records and results.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agent::OutputConfig;
use crate::model::OutputSchema;

/// A goal to run on the device, plus what the caller wants back.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub goal: String,
    /// Task name used in logs; defaults to the task ID.
    pub name: Option<String>,
    pub output: OutputConfig,
    /// Overrides the configured step ceiling.
    pub max_steps: Option<u32>,
    pub thoughts_output_path: Option<PathBuf>,
    pub llm_output_path: Option<PathBuf>,
}

impl TaskRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            name: None,
            output: OutputConfig::default(),
            max_steps: None,
            thoughts_output_path: None,
            llm_output_path: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Describe the expected output in natural language.
    pub fn with_output_description(mut self, description: impl Into<String>) -> Self {
        self.output = self.output.with_description(description);
        self
    }

    /// Ask for output matching `schema`.
    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output = self.output.with_schema(schema);
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_thoughts_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.thoughts_output_path = Some(path.into());
        self
    }

    pub fn with_llm_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.llm_output_path = Some(path.into());
        self
    }
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Bookkeeping for one task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub goal: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(request: &TaskRequest) -> Self {
        let id = Uuid::new_v4().to_string();
        Self {
            name: request.name.clone().unwrap_or_else(|| id.clone()),
            id,
            goal: request.goal.clone(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
    }

    /// Close the task with a terminal status.
    pub fn finalize(&mut self, status: TaskStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Seconds between creation and end (or now, while running).
    pub fn elapsed_seconds(&self) -> f64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.created_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Outcome of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    /// Final output; `None` when the task failed or nothing could be extracted.
    pub content: Option<Value>,
    pub error: Option<String>,
    /// Full thought log of the run.
    pub thoughts: Vec<String>,
    pub steps_taken: u32,
    pub execution_time_seconds: f64,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Write the thought log as pretty JSON.
pub fn record_events(path: &Path, thoughts: &[String]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(thoughts)?)?;
    Ok(())
}

/// Write a task's final content. Strings are written as-is, anything else as JSON.
pub fn record_output(path: &Path, content: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let text = match content {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other)?,
    };
    fs::write(path, text)?;
    Ok(())
}
