//! Device description and observation.
//!
//! Device control protocols live outside this crate; the control loop only
//! needs to know what the device is and what it currently shows.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mobile platform of the controlled device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Android,
    Ios,
}

impl DevicePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

impl fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Information about the connected device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceContext {
    pub device_id: String,
    pub platform: DevicePlatform,
    pub width: u32,
    pub height: u32,
}

impl DeviceContext {
    pub fn new(
        device_id: impl Into<String>,
        platform: DevicePlatform,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            platform,
            width,
            height,
        }
    }

    /// Short description for LLM context.
    pub fn describe(&self) -> String {
        format!(
            "Device {} ({}), screen {}x{} pixels",
            self.device_id, self.platform, self.width, self.height
        )
    }
}

/// Represents a captured screenshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    pub base64_data: String,
    pub width: u32,
    pub height: u32,
}

impl Screenshot {
    /// Create a new screenshot.
    pub fn new(base64_data: String, width: u32, height: u32) -> Self {
        Self {
            base64_data,
            width,
            height,
        }
    }
}

/// Reads the current device state.
#[async_trait]
pub trait DeviceObserver: Send + Sync {
    /// The observed device.
    fn device(&self) -> &DeviceContext;

    /// Capture the screen.
    async fn screenshot(&self) -> anyhow::Result<Screenshot>;

    /// Current UI hierarchy, as a list of elements.
    async fn ui_hierarchy(&self) -> anyhow::Result<Vec<Value>>;

    /// Information about the focused app (package or bundle, activity...).
    async fn focused_app_info(&self) -> anyhow::Result<Option<String>>;

    /// Device-local date and time.
    async fn device_date(&self) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let device = DeviceContext::new("emulator-5554", DevicePlatform::Android, 1080, 2400);
        assert_eq!(
            device.describe(),
            "Device emulator-5554 (android), screen 1080x2400 pixels"
        );
    }
}
