//! Headless script execution
//!
//! Prepares a snippet for the sandbox (size check, module simulation) and
//! turns the sandbox report into an [`ExecutionResult`].

use crate::classifier::Language;
use crate::error::{EngineError, Result};
use crate::limits::SandboxLimits;
use crate::rewrite::{check_module_syntax, rewrite_modules, ModuleRewrite};
use crate::runtime::ScriptRuntime;
use crate::types::ExecutionResult;
use std::sync::Arc;

/// Source ready for the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedScript {
    pub source: String,
    /// Present when module syntax was simulated
    pub rewrite: Option<ModuleRewrite>,
}

/// Runs scripts through a [`ScriptRuntime`]
pub struct ScriptExecutor {
    runtime: Arc<dyn ScriptRuntime>,
    max_code_bytes: usize,
}

impl ScriptExecutor {
    pub fn new(runtime: Arc<dyn ScriptRuntime>, limits: &SandboxLimits) -> Self {
        Self {
            runtime,
            max_code_bytes: limits.max_code_bytes,
        }
    }

    pub fn runtime_name(&self) -> &str {
        self.runtime.name()
    }

    pub fn prepare(&self, code: &str) -> Result<PreparedScript> {
        if code.len() > self.max_code_bytes {
            return Err(EngineError::CodeTooLarge {
                size: code.len(),
                max: self.max_code_bytes,
            });
        }
        check_module_syntax(code)?;

        Ok(match rewrite_modules(code) {
            Some(rewrite) => {
                tracing::debug!(
                    bindings = rewrite.bindings.len(),
                    exports = rewrite.exports,
                    "Simulating module syntax"
                );
                PreparedScript {
                    source: rewrite.source.clone(),
                    rewrite: Some(rewrite),
                }
            }
            None => PreparedScript {
                source: code.to_string(),
                rewrite: None,
            },
        })
    }

    /// Run `code` headlessly; output lines are joined with newlines
    pub async fn run_script(&self, code: &str) -> ExecutionResult {
        let prepared = match self.prepare(code) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(error = %e, "Script rejected before execution");
                return ExecutionResult::failure(&e, "").with_language(Language::Script);
            }
        };

        let report = self.runtime.run(&prepared.source).await;
        let output = report.output();
        let result = match &report.failure {
            None => ExecutionResult::text(output),
            Some(e) => {
                tracing::info!(error = %e, runtime = self.runtime.name(), "Script failed");
                ExecutionResult::failure(e, output)
            }
        };
        result.with_language(Language::Script)
    }
}
