//! Resource limits for sandboxed script execution

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the window stub does with `window.addEventListener('load', fn)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadEventMode {
    /// Invoke the listener synchronously at registration
    #[default]
    Immediate,
    /// Only record the registration, like every other listener
    Record,
}

/// Resource limits for script execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxLimits {
    /// Wall-clock budget for the whole run, including timer emulation
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// `setTimeout` delays above this are clamped down
    #[serde(with = "humantime_serde")]
    pub max_timeout_delay: Duration,

    /// `setInterval` periods below this are raised
    #[serde(with = "humantime_serde")]
    pub min_interval_period: Duration,

    /// Virtual time after which pending timers are cancelled instead of fired
    #[serde(with = "humantime_serde")]
    pub timer_horizon: Duration,

    /// Maximum number of timer callbacks fired per run
    pub max_timer_callbacks: usize,

    /// V8 heap limit in bytes
    pub max_heap_bytes: usize,

    /// Maximum accepted snippet size in bytes
    pub max_code_bytes: usize,

    /// Console lines kept per run; later lines are dropped
    pub max_output_lines: usize,

    /// Maximum concurrent isolates
    pub max_concurrent: usize,

    pub load_event_mode: LoadEventMode,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            max_timeout_delay: Duration::from_millis(3_000),
            min_interval_period: Duration::from_millis(300),
            timer_horizon: Duration::from_secs(10),
            max_timer_callbacks: 100,
            max_heap_bytes: 64 * 1024 * 1024, // 64 MB
            max_code_bytes: 256 * 1024,       // 256 KB
            max_output_lines: 1_000,
            max_concurrent: 8,
            load_event_mode: LoadEventMode::Immediate,
        }
    }
}

impl SandboxLimits {
    /// Tight limits for tests and constrained hosts
    pub fn strict() -> Self {
        Self {
            timeout: Duration::from_millis(1_000),
            timer_horizon: Duration::from_secs(3),
            max_timer_callbacks: 20,
            max_heap_bytes: 16 * 1024 * 1024,
            max_code_bytes: 32 * 1024,
            max_output_lines: 200,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
