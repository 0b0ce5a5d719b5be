use thiserror::Error;

/// Failures surfaced by the execution engine.
///
/// Every variant is converted into a failed [`crate::ExecutionResult`] at the
/// `execute()` boundary; none of them escape to the caller as a panic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unsupported language '{declared}'. Only JavaScript, HTML and CSS can be executed")]
    UnsupportedLanguage { declared: String },

    #[error(
        "Module syntax ({syntax}) looks like {language} code, not JavaScript. \
         Only JavaScript snippets can be executed"
    )]
    CrossLanguageModuleSyntax { language: String, syntax: String },

    #[error("Execution timed out after {timeout_ms}ms")]
    SandboxTimeout { timeout_ms: u64 },

    #[error("Script exceeded the {limit_mb}MB heap limit")]
    HeapLimitExceeded { limit_mb: usize },

    #[error("{0}")]
    SandboxRuntime(String),

    #[error("Sandbox setup failed: {0}")]
    SandboxSetup(String),

    #[error("Document parse error: {0}")]
    DocumentParse(String),

    #[error("CSS syntax error: {0}")]
    StyleSyntax(String),

    #[error("Code is too large ({size} bytes, limit {max} bytes)")]
    CodeTooLarge { size: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<toml::de::Error> for EngineError {
    fn from(e: toml::de::Error) -> Self {
        EngineError::Config(e.to_string())
    }
}
