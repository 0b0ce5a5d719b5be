//! Workbench engine - main entry point

use crate::classifier::{is_dom_oriented, reconcile, Language};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::executor::ScriptExecutor;
use crate::preview::{
    build_interactive_document, DocumentEngine, Html5everEngine, MarkupRenderer, StylePreviewer,
};
use crate::runtime::{ScriptRuntime, V8Runtime};
use crate::state::{SessionId, SessionStore};
use crate::types::{ExecutionRequest, ExecutionResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Unique identifier for one `execute` call, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionId(uuid::Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classifies snippets and routes them to the script sandbox or a previewer
pub struct WorkbenchEngine {
    config: EngineConfig,
    executor: ScriptExecutor,
    markup: Arc<MarkupRenderer>,
    style: StylePreviewer,
    sessions: SessionStore,
}

impl WorkbenchEngine {
    /// Create an engine backed by the V8 sandbox
    pub fn new(config: EngineConfig) -> Self {
        let runtime = V8Runtime::new(config.sandbox.clone())
            .with_base_url(config.preview.base_url.clone());
        Self::with_runtime(config, runtime)
    }

    /// Create an engine with a custom script runtime
    pub fn with_runtime(config: EngineConfig, runtime: impl ScriptRuntime + 'static) -> Self {
        let engine: Arc<dyn DocumentEngine> =
            Arc::new(Html5everEngine::new().with_base_url(config.preview.base_url.clone()));
        let markup = Arc::new(MarkupRenderer::new(engine.clone(), config.preview.title.clone()));
        let style = StylePreviewer::new(markup.clone(), engine, config.preview.title.clone());

        Self {
            executor: ScriptExecutor::new(Arc::new(runtime), &config.sandbox),
            markup,
            style,
            sessions: SessionStore::new(config.sessions.capacity, config.sessions.idle_ttl),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Execute or preview one snippet. Never fails: every error is folded
    /// into an unsuccessful [`ExecutionResult`].
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let id = ExecutionId::new();
        let span = tracing::info_span!(
            "execute",
            execution_id = %id,
            session = %request.session,
            declared = %request.declared_language,
        );

        async {
            let start = Instant::now();
            tracing::info!(
                runtime = self.executor.runtime_name(),
                code_len = request.code.len(),
                "Executing code"
            );

            self.sessions.evict_idle().await;
            let mut result = self.dispatch(&request).await;
            result.duration_ms = start.elapsed().as_millis() as u64;

            tracing::info!(
                success = result.success,
                is_document = result.is_document,
                language = result.language.map(Language::as_str),
                duration_ms = result.duration_ms,
                "Execution finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Shorthand for [`execute`](Self::execute) with a declared language tag
    pub async fn execute_code(
        &self,
        session: &SessionId,
        code: &str,
        language: &str,
    ) -> ExecutionResult {
        self.execute(ExecutionRequest::new(code, language).in_session(session.clone()))
            .await
    }

    /// Forget a session's markup and style state
    pub async fn end_session(&self, session: &SessionId) -> bool {
        self.sessions.end_session(session).await
    }

    async fn dispatch(&self, request: &ExecutionRequest) -> ExecutionResult {
        let max = self.config.sandbox.max_code_bytes;
        if request.code.len() > max {
            let error = EngineError::CodeTooLarge {
                size: request.code.len(),
                max,
            };
            return ExecutionResult::failure(&error, "");
        }

        let resolution = match reconcile(&request.declared_language, &request.code) {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected request");
                return ExecutionResult::failure(&e, "");
            }
        };
        if let Some(warning) = &resolution.warning {
            tracing::warn!(detected = %resolution.detected, "{}", warning);
        }

        let mut result = match resolution.language {
            Language::Script if is_dom_oriented(&request.code) => {
                self.preview_script(&request.code)
            }
            Language::Script => self.run_script(&request.session, &request.code).await,
            Language::Markup => {
                let state = self.sessions.state(&request.session).await;
                let mut state = state.lock().await;
                self.markup.render(&mut state, &request.code)
            }
            Language::Style => {
                let state = self.sessions.state(&request.session).await;
                let mut state = state.lock().await;
                self.style.render(&mut state, &request.code)
            }
        };

        result.language = Some(resolution.language);
        result.warnings.extend(resolution.warning);
        result
    }

    fn preview_script(&self, code: &str) -> ExecutionResult {
        tracing::debug!("DOM-oriented script, synthesizing interactive preview");
        match build_interactive_document(code, &self.config.preview.title) {
            Ok(document) => ExecutionResult::document(
                "Interactive preview generated. Open it in a browser to run the script.",
                document,
            ),
            Err(e) => ExecutionResult::failure(&e, ""),
        }
    }

    async fn run_script(&self, session: &SessionId, code: &str) -> ExecutionResult {
        let result = self.executor.run_script(code).await;

        let state = self.sessions.state(session).await;
        let mut state = state.lock().await;
        state.last_script_output = Some(result.output.clone());
        state.touch();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SandboxReport;
    use async_trait::async_trait;

    /// Echoes a fixed line; lets routing be tested without V8
    struct EchoRuntime;

    #[async_trait]
    impl ScriptRuntime for EchoRuntime {
        async fn run(&self, _source: &str) -> SandboxReport {
            SandboxReport {
                lines: vec!["ran".to_string()],
                ..SandboxReport::default()
            }
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn engine() -> WorkbenchEngine {
        WorkbenchEngine::with_runtime(EngineConfig::default(), EchoRuntime)
    }

    #[tokio::test]
    async fn test_script_routes_to_sandbox() {
        let engine = engine();
        let session = SessionId::from("s");
        let result = engine
            .execute_code(&session, "const x = 1; console.log(x);", "javascript")
            .await;
        assert!(result.success);
        assert_eq!(result.output, "ran");
        assert_eq!(result.language, Some(Language::Script));

        let state = engine.sessions().snapshot(&session).await.unwrap();
        assert_eq!(state.last_script_output.as_deref(), Some("ran"));
        assert!(!state.markup_mode);
    }

    #[tokio::test]
    async fn test_dom_script_routes_to_preview() {
        let result = engine()
            .execute_code(
                &SessionId::default(),
                "document.getElementById('b').addEventListener('click', go);",
                "js",
            )
            .await;
        assert!(result.success);
        assert!(result.is_document);
        assert!(result
            .document_content
            .unwrap()
            .contains("document.getElementById('b')"));
    }

    #[tokio::test]
    async fn test_unsupported_language_is_redispatched() {
        let result = engine()
            .execute_code(&SessionId::default(), "<div>x</div>", "ruby")
            .await;
        assert!(result.success);
        assert_eq!(result.language, Some(Language::Markup));
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_pair_fails() {
        let result = engine()
            .execute_code(&SessionId::default(), "def f():\n    print(1)", "python")
            .await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Unsupported language 'python'. Only JavaScript, HTML and CSS can be executed")
        );
    }

    #[tokio::test]
    async fn test_oversized_code_is_rejected() {
        let mut config = EngineConfig::default();
        config.sandbox.max_code_bytes = 4;
        let engine = WorkbenchEngine::with_runtime(config, EchoRuntime);
        let result = engine.execute(ExecutionRequest::new("<p>long</p>", "html")).await;
        assert!(!result.success);
        assert!(engine.sessions().is_empty().await);
    }
}
