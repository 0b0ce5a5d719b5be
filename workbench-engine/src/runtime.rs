//! Script runtime trait and implementations

pub mod v8;

use crate::error::EngineError;
use async_trait::async_trait;
use std::time::Duration;

pub use v8::V8Runtime;

/// What a sandboxed run left behind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SandboxReport {
    /// Console lines in emission order, markers included
    pub lines: Vec<String>,
    /// Set when the run was aborted
    pub failure: Option<EngineError>,
    /// Timers still pending when emulation stopped
    pub cancelled_timers: usize,
    pub elapsed: Duration,
}

impl SandboxReport {
    pub fn failed(error: EngineError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn output(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runtime abstraction for executing script source
#[async_trait]
pub trait ScriptRuntime: Send + Sync {
    /// Run `source` to completion, including pending timers
    async fn run(&self, source: &str) -> SandboxReport;

    /// Get runtime name
    fn name(&self) -> &str;
}
