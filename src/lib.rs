// Copyright 2025 ModerRAS
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Mobile Use
//!
//! Multi-agent control loop for automating mobile devices with LLMs.
//!
//! A planner breaks the goal into subgoals, an orchestrator walks the
//! subgoal ledger, a cortex decides UI actions from device observations,
//! and an executor turns those decisions into tool calls. The loop keeps
//! going until every subgoal succeeds or a step fails for good.
//!
//! The crate owns the loop only. Models, device observation and device
//! tools are supplied by the host through [`LlmProvider`],
//! [`DeviceObserver`] and [`ToolExecutor`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mobile_use::{
//!     AppSettings, ControlLoopBuilder, DeviceObserver, LlmProvider, MobileAgent, TaskRequest,
//!     ToolExecutor,
//! };
//!
//! async fn run(
//!     llm: Arc<dyn LlmProvider>,
//!     device: Arc<dyn DeviceObserver>,
//!     tools: Arc<dyn ToolExecutor>,
//! ) -> anyhow::Result<()> {
//!     let settings = AppSettings::load();
//!     mobile_use::logging::init_logging(settings.verbose);
//!
//!     let control_loop = ControlLoopBuilder::new()
//!         .with_llm(llm)
//!         .with_device(device)
//!         .with_tools(tools)
//!         .with_config(settings.agent_config())
//!         .build()
//!         .map_err(anyhow::Error::msg)?;
//!     let agent = MobileAgent::new(control_loop);
//!
//!     let result = agent
//!         .run_task(
//!             TaskRequest::new("Turn on wifi and report the network name")
//!                 .with_output_description("The wifi network name"),
//!         )
//!         .await;
//!     println!("{:?}: {:?}", result.status, result.content);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod device;
pub mod logging;
pub mod model;
pub mod settings;
pub mod task;
pub mod tools;

pub use agent::{
    AgentError, ControlLoop, ControlLoopBuilder, CortexOutput, LoopOutcome, LoopState,
    MobileAgent, OutputConfig, SessionState, StateUpdate, Subgoal, SubgoalPlan, SubgoalStatus,
};
pub use config::{AgentConfig, AgentNode, LlmConfig, LlmSpec, LlmWithFallback, RetryPolicy};
pub use device::{DeviceContext, DeviceObserver, DevicePlatform, Screenshot};
pub use model::{LlmClient, LlmError, LlmProvider, MessageBuilder, OutputSchema, StructuredOutput};
pub use settings::{AppSettings, SettingsError};
pub use task::{Task, TaskRequest, TaskResult, TaskStatus};
pub use tools::{
    ExecutorMessage, ToolCall, ToolContractError, ToolExecutor, ToolMessage, ToolOutput,
    ToolSpec, ToolStatus,
};
