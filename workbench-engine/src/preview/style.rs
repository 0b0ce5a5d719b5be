//! Style previews
//!
//! A stylesheet is shown against the markup the session rendered last, or,
//! when there is none, against a gallery of sample elements.

use super::markup::{MarkupRenderer, USER_STYLE_MARKER};
use super::template::{escape_text, fill};
use super::DocumentEngine;
use crate::classifier::Language;
use crate::error::{EngineError, Result};
use crate::state::ExecutionState;
use crate::types::ExecutionResult;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const GALLERY_TEMPLATE: &str = include_str!("templates/gallery.html");

pub struct StylePreviewer {
    markup: Arc<MarkupRenderer>,
    engine: Arc<dyn DocumentEngine>,
    title: String,
}

impl StylePreviewer {
    pub fn new(
        markup: Arc<MarkupRenderer>,
        engine: Arc<dyn DocumentEngine>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            markup,
            engine,
            title: title.into(),
        }
    }

    pub fn render(&self, state: &mut ExecutionState, code: &str) -> ExecutionResult {
        let composes = state.composes_with_markup();
        match self.compose(state, code) {
            Ok(document) => {
                let output = if composes {
                    "CSS applied to the current HTML preview"
                } else {
                    "CSS preview rendered"
                };
                ExecutionResult::document(output, document)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Style preview failed");
                ExecutionResult::failure(&e, "")
            }
        }
        .with_language(Language::Style)
    }

    fn compose(&self, state: &mut ExecutionState, code: &str) -> Result<String> {
        check_style_syntax(code)?;
        let block = user_style(code);

        if let Some(markup) = state.last_markup.clone().filter(|_| state.markup_mode) {
            state.last_composed = Some(format!(
                "<html><head>{}</head><body></body></html>",
                block
            ));
            return self.markup.compose(state, &markup);
        }

        let document = fill(
            GALLERY_TEMPLATE,
            &[("title", &escape_text(&self.title)), ("style", &block)],
        )?;
        let normalized = self.engine.normalize(&document)?;
        state.last_composed = Some(normalized.clone());
        state.touch();
        Ok(normalized)
    }
}

/// Wrap rules in the block markup renders carry forward
fn user_style(code: &str) -> String {
    static STYLE_CLOSE: OnceLock<Regex> = OnceLock::new();
    let style_close = STYLE_CLOSE
        .get_or_init(|| Regex::new(r"(?i)</(style)").expect("style close pattern is valid"));
    format!(
        "<style {}>\n{}\n</style>",
        USER_STYLE_MARKER,
        style_close.replace_all(code, "<\\/$1")
    )
}

/// Reject stylesheets with unbalanced braces or an unterminated comment or string
pub fn check_style_syntax(code: &str) -> Result<()> {
    let mut depth: usize = 0;
    let mut line = 1;
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let start = line;
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        line += 1;
                    } else if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(EngineError::StyleSyntax(format!(
                        "unterminated comment starting on line {}",
                        start
                    )));
                }
            }
            '"' | '\'' => {
                let quote = c;
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '\n' => break,
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return Err(EngineError::StyleSyntax(format!(
                        "unterminated string on line {}",
                        line
                    )));
                }
            }
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Err(EngineError::StyleSyntax(format!(
                        "unexpected '}}' on line {}",
                        line
                    )));
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(EngineError::StyleSyntax(format!(
            "{} unclosed '{{' at end of input",
            depth
        )));
    }
    Ok(())
}
