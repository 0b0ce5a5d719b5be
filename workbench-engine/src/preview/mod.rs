//! Document synthesis for markup, style and DOM-oriented scripts

pub mod interactive;
pub mod markup;
pub mod style;
pub mod template;

use crate::error::{EngineError, Result};
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

pub use interactive::build_interactive_document;
pub use markup::MarkupRenderer;
pub use style::{check_style_syntax, StylePreviewer};

/// Parses document text and serializes it back as a normalized document
pub trait DocumentEngine: Send + Sync {
    fn normalize(&self, html: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// WHATWG HTML parsing via html5ever
#[derive(Debug, Clone)]
pub struct Html5everEngine {
    scripting_enabled: bool,
    /// Placeholder base URL documents are considered to live at
    base_url: String,
}

impl Html5everEngine {
    pub fn new() -> Self {
        Self {
            scripting_enabled: true,
            base_url: "http://localhost/".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse `<noscript>` content as markup instead of raw text
    pub fn without_scripting(mut self) -> Self {
        self.scripting_enabled = false;
        self
    }
}

impl Default for Html5everEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentEngine for Html5everEngine {
    fn normalize(&self, html: &str) -> Result<String> {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: self.scripting_enabled,
                drop_doctype: false,
                ..Default::default()
            },
            ..Default::default()
        };

        let dom = parse_document(RcDom::default(), opts)
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| EngineError::DocumentParse(e.to_string()))?;

        let document: SerializableHandle = dom.document.clone().into();
        let mut bytes = Vec::with_capacity(html.len());
        serialize(&mut bytes, &document, SerializeOpts::default())
            .map_err(|e| EngineError::DocumentParse(e.to_string()))?;

        let normalized =
            String::from_utf8(bytes).map_err(|e| EngineError::DocumentParse(e.to_string()))?;
        tracing::debug!(
            base_url = %self.base_url,
            input_bytes = html.len(),
            output_bytes = normalized.len(),
            "Normalized document"
        );
        Ok(normalized)
    }

    fn name(&self) -> &str {
        "html5ever"
    }
}
