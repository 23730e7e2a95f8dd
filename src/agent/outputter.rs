//! Outputter: extracts the final result of a task from its thought log.

use serde_json::Value;

use crate::config::{AgentNode, OUTPUTTER_SYSTEM_PROMPT};
use crate::model::{extract_json, LlmError, LlmProvider, MessageBuilder, OutputSchema};

use super::state::SessionState;

/// What the caller wants back from a task.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Natural-language description of the expected output.
    pub description: Option<String>,
    /// Shape of the expected output.
    pub schema: OutputSchema,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            description: None,
            schema: OutputSchema::NoSchema,
        }
    }
}

impl OutputConfig {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Whether the caller asked for anything at all.
    pub fn needs_outputter(&self) -> bool {
        self.description.is_some() || self.schema != OutputSchema::NoSchema
    }
}

pub struct OutputterNode<'a> {
    llm: &'a dyn LlmProvider,
}

impl<'a> OutputterNode<'a> {
    pub fn new(llm: &'a dyn LlmProvider) -> Self {
        Self { llm }
    }

    /// Produce the final content of a task.
    ///
    /// Without an output config the content is the last thought. Failures
    /// are logged and yield no content.
    pub async fn run(&self, config: &OutputConfig, state: &SessionState) -> Option<Value> {
        if !config.needs_outputter() {
            return state.last_thought().map(|t| Value::String(t.to_string()));
        }

        tracing::info!("Starting Outputter Agent");
        match self.generate(config, state).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Outputter failed: {}", e);
                None
            }
        }
    }

    async fn generate(
        &self,
        config: &OutputConfig,
        state: &SessionState,
    ) -> Result<Option<Value>, LlmError> {
        let schema_text = config
            .schema
            .json_schema()
            .map(|schema| schema.to_string())
            .unwrap_or_else(|| "None".to_string());
        let text = format!(
            "Goal: {}\n\nThoughts of the agents:\n{}\n\nExpected output description: {}\n\nExpected output schema: {}\n\nAnswer with JSON only.",
            state.initial_goal,
            state.thoughts_text(),
            config.description.as_deref().unwrap_or("None"),
            schema_text,
        );
        let mut messages = vec![
            MessageBuilder::create_system_message(OUTPUTTER_SYSTEM_PROMPT),
            MessageBuilder::create_user_message(&text, None),
        ];
        if let Some(description) = &config.description {
            messages.push(MessageBuilder::create_user_message(description, None));
        }

        let llm = self.llm.llm(AgentNode::Outputter, false)?;
        let answer = llm.invoke(&messages, &config.schema).await?;
        Ok(answer.map(|value| match value {
            Value::String(text) => extract_json(&text)
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or(Value::String(text)),
            other => other,
        }))
    }
}
