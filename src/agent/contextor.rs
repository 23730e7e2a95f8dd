//! Collects device observations before each cortex turn.

use crate::config::AgentNode;
use crate::device::DeviceObserver;
use crate::tools::GLIMPSE_SCREEN_TOOL;

use super::error::AgentError;
use super::state::{Observations, SessionState, StateUpdate};

pub struct ContextorNode<'a> {
    device: &'a dyn DeviceObserver,
}

impl<'a> ContextorNode<'a> {
    pub fn new(device: &'a dyn DeviceObserver) -> Self {
        Self { device }
    }

    /// Observe the device.
    ///
    /// The screenshot is only taken when the last tool call successfully
    /// asked to look at the screen.
    pub async fn run(&self, state: &SessionState) -> Result<StateUpdate, AgentError> {
        let wants_screenshot = state
            .last_tool_message()
            .is_some_and(|m| m.name == GLIMPSE_SCREEN_TOOL && !m.is_error());
        let screenshot = if wants_screenshot {
            let screenshot = self.device.screenshot().await.map_err(observation_error)?;
            Some(screenshot.base64_data)
        } else {
            None
        };

        let ui_hierarchy = self.device.ui_hierarchy().await.map_err(observation_error)?;
        let focused_app_info = self
            .device
            .focused_app_info()
            .await
            .map_err(observation_error)?;
        let device_date = self.device.device_date().await.map_err(observation_error)?;

        tracing::debug!(
            "Observed {} UI elements, focused app: {:?}",
            ui_hierarchy.len(),
            focused_app_info
        );

        Ok(StateUpdate::new(AgentNode::Contextor).with_observations(Observations {
            screenshot,
            ui_hierarchy: Some(ui_hierarchy),
            focused_app_info,
            device_date: Some(device_date),
        }))
    }
}

fn observation_error(e: anyhow::Error) -> AgentError {
    AgentError::Observation(format!("{:#}", e))
}
