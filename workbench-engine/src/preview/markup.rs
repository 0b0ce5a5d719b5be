//! Markup rendering with carried-over style

use super::template::{escape_text, fill};
use super::DocumentEngine;
use crate::classifier::Language;
use crate::error::Result;
use crate::state::ExecutionState;
use crate::types::ExecutionResult;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const SHELL_TEMPLATE: &str = include_str!("templates/shell.html");

/// Attribute marking the style block a session carries between renders
pub const USER_STYLE_MARKER: &str = "data-workbench=\"user-style\"";

/// Renders markup into a full document, merging the session's latest style
pub struct MarkupRenderer {
    engine: Arc<dyn DocumentEngine>,
    title: String,
}

impl MarkupRenderer {
    pub fn new(engine: Arc<dyn DocumentEngine>, title: impl Into<String>) -> Self {
        Self {
            engine,
            title: title.into(),
        }
    }

    pub fn render(&self, state: &mut ExecutionState, code: &str) -> ExecutionResult {
        match self.compose(state, code) {
            Ok(document) => ExecutionResult::document("HTML rendered successfully", document),
            Err(e) => {
                tracing::warn!(error = %e, "Markup render failed");
                ExecutionResult::failure(&e, "")
            }
        }
        .with_language(Language::Markup)
    }

    /// Build the document for `code` and record it in `state`
    pub(crate) fn compose(&self, state: &mut ExecutionState, code: &str) -> Result<String> {
        let document = if code.to_ascii_lowercase().contains("<html") {
            code.to_string()
        } else {
            fill(
                SHELL_TEMPLATE,
                &[("title", &escape_text(&self.title)), ("body", code)],
            )?
        };

        // Normalized output always has a <head>, even when `code` has none
        let mut normalized = self.engine.normalize(&document)?;
        if let Some(previous) = state.last_composed.as_deref() {
            if let Some(spliced) = splice_user_style(&normalized, previous) {
                normalized = self.engine.normalize(&spliced)?;
            }
        }

        state.markup_mode = true;
        state.last_markup = Some(code.to_string());
        state.last_composed = Some(normalized.clone());
        state.touch();
        Ok(normalized)
    }
}

/// The carried style block in `document`, if any
pub fn user_style_block(document: &str) -> Option<&str> {
    static USER_STYLE: OnceLock<Regex> = OnceLock::new();
    USER_STYLE
        .get_or_init(|| {
            Regex::new(r#"(?is)<style\b[^>]*\bdata-workbench\s*=\s*"user-style"[^>]*>.*?</style\s*>"#)
                .expect("user style pattern is valid")
        })
        .find(document)
        .map(|found| found.as_str())
}

/// Insert the style block carried by `previous` before `</head>` of a
/// normalized `document`.
///
/// `None` when there is nothing to carry or `document` already has one.
fn splice_user_style(document: &str, previous: &str) -> Option<String> {
    let block = user_style_block(previous)?;
    if user_style_block(document).is_some() {
        return None;
    }
    let Some(head_end) = document.find("</head>") else {
        tracing::warn!("Normalized document has no </head>; style not carried");
        return None;
    };

    let mut spliced = String::with_capacity(document.len() + block.len() + 1);
    spliced.push_str(&document[..head_end]);
    spliced.push_str(block);
    spliced.push('\n');
    spliced.push_str(&document[head_end..]);
    Some(spliced)
}
