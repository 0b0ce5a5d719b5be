//! Engine configuration

use crate::error::{EngineError, Result};
use crate::limits::SandboxLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration, loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Script sandbox limits
    pub sandbox: SandboxLimits,
    /// Document synthesis settings
    pub preview: PreviewConfig,
    /// Session store bounds
    pub sessions: SessionConfig,
}

/// Document synthesis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Placeholder base URL recorded by the document engine and shown to scripts as `window.location`
    pub base_url: String,
    /// `<title>` used for synthesized documents
    pub title: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            title: "Preview".to_string(),
        }
    }
}

/// Session store bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions kept before the least recently used one is evicted
    pub capacity: usize,
    /// Sessions untouched for longer than this are evicted
    #[serde(with = "humantime_serde")]
    pub idle_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            idle_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration text; missing sections take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over the file
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("WORKBENCH_SCRIPT_TIMEOUT_MS") {
            let ms: u64 = value.trim().parse().map_err(|_| {
                EngineError::Config(format!("WORKBENCH_SCRIPT_TIMEOUT_MS is not a number: {}", value))
            })?;
            self.sandbox.timeout = Duration::from_millis(ms);
        }
        if let Ok(value) = std::env::var("WORKBENCH_MAX_SESSIONS") {
            self.sessions.capacity = value.trim().parse().map_err(|_| {
                EngineError::Config(format!("WORKBENCH_MAX_SESSIONS is not a number: {}", value))
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.sandbox.timeout.is_zero() {
            return Err(EngineError::Config("sandbox.timeout must be positive".to_string()));
        }
        if self.sandbox.max_concurrent == 0 {
            return Err(EngineError::Config(
                "sandbox.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.sessions.capacity == 0 {
            return Err(EngineError::Config(
                "sessions.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
