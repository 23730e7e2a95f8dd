//! Scripted doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::config::AgentNode;
use crate::device::{DeviceContext, DeviceObserver, DevicePlatform, Screenshot};
use crate::model::{LlmClient, LlmError, LlmProvider, OutputSchema};
use crate::tools::{ToolCall, ToolExecutor, ToolMessage, ToolOutput, ToolSpec};

/// LLM answering from a script, one entry per call.
#[derive(Default)]
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<Result<Option<Value>, String>>>,
    calls: Mutex<Vec<Vec<Value>>>,
}

impl ScriptedLlm {
    pub fn new(answers: Vec<Result<Option<Value>, String>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// LLM that always answers with the given values, in order.
    pub fn answering(values: Vec<Value>) -> Arc<Self> {
        Self::new(values.into_iter().map(|v| Ok(Some(v))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Messages of every call so far.
    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn invoke(
        &self,
        messages: &[Value],
        _schema: &OutputSchema,
    ) -> Result<Option<Value>, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(e)) => Err(LlmError::RequestFailed(e)),
            None => Err(LlmError::RequestFailed("script exhausted".to_string())),
        }
    }
}

/// Provider handing out scripted LLMs per agent.
#[derive(Default)]
pub struct ScriptedProvider {
    llms: HashMap<(AgentNode, bool), Arc<ScriptedLlm>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

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

/// Tool executor answering from a script; succeeds once the script runs out.
pub struct ScriptedTools {
    outputs: Mutex<VecDeque<anyhow::Result<ToolOutput>>>,
    executed: Mutex<Vec<ToolCall>>,
}

impl ScriptedTools {
    pub fn new(outputs: Vec<anyhow::Result<ToolOutput>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed_ids(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.id.clone())
            .collect()
    }
}

#[async_trait]
impl ToolExecutor for ScriptedTools {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec::new("tap", "Tap an element"),
            ToolSpec::new("glimpse_screen", "Look at the screen"),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> anyhow::Result<ToolOutput> {
        self.executed.lock().unwrap().push(call.clone());
        match self.outputs.lock().unwrap().pop_front() {
            Some(output) => output,
            None => Ok(ToolOutput::Message(ToolMessage::success(call, "ok"))),
        }
    }
}

/// Device with a fixed state.
pub struct FakeDevice {
    context: DeviceContext,
    pub fail: bool,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            context: DeviceContext::new("emulator-5554", DevicePlatform::Android, 1080, 2400),
            fail: false,
        }
    }
}

#[async_trait]
impl DeviceObserver for FakeDevice {
    fn device(&self) -> &DeviceContext {
        &self.context
    }

    async fn screenshot(&self) -> anyhow::Result<Screenshot> {
        Ok(Screenshot::new("c2NyZWVu".to_string(), 1080, 2400))
    }

    async fn ui_hierarchy(&self) -> anyhow::Result<Vec<Value>> {
        if self.fail {
            anyhow::bail!("uiautomator dump failed");
        }
        Ok(vec![serde_json::json!({"text": "Settings", "bounds": [0, 0, 100, 100]})])
    }

    async fn focused_app_info(&self) -> anyhow::Result<Option<String>> {
        Ok(Some("com.android.settings".to_string()))
    }

    async fn device_date(&self) -> anyhow::Result<String> {
        Ok("Thu Oct 16 10:00:00 UTC 2025".to_string())
    }
}
