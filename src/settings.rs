//! Persisted settings for hosts embedding the agent.
//! Stored in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::{
    AgentConfig, LlmConfig, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_STEPS,
    DEFAULT_RETRY_DELAY_SECS,
};

/// Settings errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot determine config directory")]
    NoConfigDir,
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Model of each agent
    pub llm: LlmConfig,
    /// Maximum steps for one task
    pub max_steps: u32,
    /// Attempts for each LLM-backed step
    pub max_retries: u32,
    /// Delay before the first retry, in seconds
    pub retry_delay: u64,
    /// Thought log file (empty to disable)
    pub thoughts_output_path: String,
    /// Final output file (empty to disable)
    pub llm_output_path: String,
    /// Debug logging
    pub verbose: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            max_steps: DEFAULT_MAX_STEPS,
            max_retries: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            thoughts_output_path: String::new(),
            llm_output_path: String::new(),
            verbose: false,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "minitap", "mobile-use")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut loaded: Self = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        // Backfill values older files left at zero
        let defaults = Self::default();
        if loaded.max_steps == 0 {
            loaded.max_steps = defaults.max_steps;
        }
        if loaded.max_retries == 0 {
            loaded.max_retries = defaults.max_retries;
        }

        tracing::debug!("Settings from {}, models:\n{}", path.display(), loaded.llm);
        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Control loop configuration described by these settings.
    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::default()
            .with_max_steps(self.max_steps)
            .with_retry(RetryPolicy::new(
                self.max_retries,
                Duration::from_secs(self.retry_delay),
            ));
        if !self.thoughts_output_path.is_empty() {
            config = config.with_thoughts_output_path(&self.thoughts_output_path);
        }
        if !self.llm_output_path.is_empty() {
            config = config.with_llm_output_path(&self.llm_output_path);
        }
        config
    }
}
