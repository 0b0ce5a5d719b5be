//! Core types for engine requests and results

use crate::classifier::{DeclaredLanguage, Language};
use crate::error::EngineError;
use crate::state::SessionId;
use serde::{Deserialize, Serialize};

/// Request to execute or preview a snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// The code to execute
    pub code: String,

    /// Language claimed by the caller
    pub declared_language: DeclaredLanguage,

    /// Editing session whose markup/style state this request composes with
    #[serde(default)]
    pub session: SessionId,
}

impl ExecutionRequest {
    /// Create a request in the default session
    pub fn new(code: impl Into<String>, language: &str) -> Self {
        Self {
            code: code.into(),
            declared_language: DeclaredLanguage::parse(language),
            session: SessionId::default(),
        }
    }

    /// Run the request inside a specific session
    pub fn in_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }
}

/// Result of a single execution
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,

    /// Console text for scripts, a short status line for documents
    pub output: String,

    pub error: Option<String>,

    /// Whether `document_content` must be rendered by a browser context
    pub is_document: bool,

    pub document_content: Option<String>,

    /// Language the request was finally dispatched under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    /// Non-fatal notes, e.g. a declared/detected language mismatch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Plain-text success
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            ..Default::default()
        }
    }

    /// Document success
    pub fn document(output: impl Into<String>, content: String) -> Self {
        Self {
            success: true,
            output: output.into(),
            is_document: true,
            document_content: Some(content),
            ..Default::default()
        }
    }

    /// Failure carrying whatever output was produced before the error
    pub fn failure(error: &EngineError, output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}
