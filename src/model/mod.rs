//! LLM client abstraction for structured agent output.

mod client;

pub use client::{
    extract_json, invoke_structured, LlmClient, LlmError, LlmProvider, MessageBuilder,
    OutputSchema, StructuredOutput, TypedSchema,
};
