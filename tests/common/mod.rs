//! Scripted collaborators for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use mobile_use::{
    AgentNode, DeviceContext, DeviceObserver, DevicePlatform, LlmClient, LlmError, LlmProvider,
    OutputSchema, Screenshot, ToolCall, ToolExecutor, ToolMessage, ToolOutput, ToolSpec,
};

/// LLM answering from a script, recording every prompt.
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<Result<Value, String>>>,
    prompts: Mutex<Vec<Vec<Value>>>,
}

impl ScriptedLlm {
    pub fn new(answers: Vec<Result<Value, String>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(answers: Vec<Value>) -> Arc<Self> {
        Self::new(answers.into_iter().map(Ok).collect())
    }

    pub fn prompts(&self) -> Vec<Vec<Value>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn invoke(
        &self,
        messages: &[Value],
        _schema: &OutputSchema,
    ) -> Result<Option<Value>, LlmError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(answer)) => Ok(Some(answer)),
            Some(Err(e)) => Err(LlmError::RequestFailed(e)),
            None => Err(LlmError::RequestFailed("script exhausted".to_string())),
        }
    }
}

#[derive(Default)]
pub struct ScriptedProvider {
    llms: HashMap<(AgentNode, bool), Arc<ScriptedLlm>>,
}

impl ScriptedProvider {
    pub fn with(mut self, agent: AgentNode, llm: Arc<ScriptedLlm>) -> Self {
        self.llms.insert((agent, false), llm);
        self
    }

    pub fn with_fallback(mut self, agent: AgentNode, llm: Arc<ScriptedLlm>) -> Self {
        self.llms.insert((agent, true), llm);
        self
    }
}

impl LlmProvider for ScriptedProvider {
    fn llm(&self, agent: AgentNode, use_fallback: bool) -> Result<Arc<dyn LlmClient>, LlmError> {
        match self.llms.get(&(agent, use_fallback)) {
            Some(llm) => Ok(llm.clone() as Arc<dyn LlmClient>),
            None if use_fallback => Err(LlmError::NoFallback(agent)),
            None => Err(LlmError::NotConfigured(agent)),
        }
    }
}

/// Tool executor that succeeds unless a tool name is marked as failing.
#[derive(Default)]
pub struct RecordingTools {
    executed: Mutex<Vec<ToolCall>>,
    failing: Vec<String>,
}

impl RecordingTools {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn executed_names(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.name.clone())
            .collect()
    }
}

#[async_trait]
impl ToolExecutor for RecordingTools {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec::new("tap", "Tap an element"),
            ToolSpec::new("launch_app", "Launch an app by package name"),
            ToolSpec::new("glimpse_screen", "Take a screenshot on the next turn"),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> anyhow::Result<ToolOutput> {
        self.executed.lock().unwrap().push(call.clone());
        if self.failing.contains(&call.name) {
            return Ok(ToolOutput::Message(ToolMessage::error(call, "element not found")));
        }
        Ok(ToolOutput::Message(ToolMessage::success(
            call,
            format!("{} done", call.name),
        )))
    }
}

pub struct StaticDevice {
    context: DeviceContext,
}

impl StaticDevice {
    pub fn new() -> Self {
        Self {
            context: DeviceContext::new("emulator-5554", DevicePlatform::Android, 1080, 2400),
        }
    }
}

#[async_trait]
impl DeviceObserver for StaticDevice {
    fn device(&self) -> &DeviceContext {
        &self.context
    }

    async fn screenshot(&self) -> anyhow::Result<Screenshot> {
        Ok(Screenshot::new("aW1hZ2U=".to_string(), 1080, 2400))
    }

    async fn ui_hierarchy(&self) -> anyhow::Result<Vec<Value>> {
        Ok(vec![json!({"resource-id": "android:id/switch_widget", "text": "Wi-Fi"})])
    }

    async fn focused_app_info(&self) -> anyhow::Result<Option<String>> {
        Ok(Some("com.android.settings".to_string()))
    }

    async fn device_date(&self) -> anyhow::Result<String> {
        Ok("2025-10-16 10:00".to_string())
    }
}

pub fn act(decisions: &str, thought: &str) -> Value {
    json!({"decisions": decisions, "agent_thought": thought})
}

pub fn complete(ids: &[&str], thought: &str) -> Value {
    json!({"decisions": "", "agent_thought": thought, "complete_subgoals_by_ids": ids})
}

pub fn calls(names: &[&str]) -> Value {
    json!({
        "tool_calls": names
            .iter()
            .map(|name| json!({"name": name, "args": {}}))
            .collect::<Vec<_>>()
    })
}

pub fn confirm(ids: &[&str], reason: &str) -> Value {
    json!({"needs_replaning": false, "reason": reason, "completed_subgoal_ids": ids})
}

pub fn replan(reason: &str) -> Value {
    json!({"needs_replaning": true, "reason": reason})
}

/// Text of the user message of a prompt.
pub fn user_text(prompt: &[Value]) -> String {
    mobile_use::MessageBuilder::text_of(&prompt[1])
}
