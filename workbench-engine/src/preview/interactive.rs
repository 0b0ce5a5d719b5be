//! Interactive previews for DOM-oriented scripts
//!
//! Such scripts need a real browser, so instead of running them we embed them
//! in a document with a chat panel, a console panel mirroring `console.*`,
//! and a bootstrap that calls `init`/`main`/`start` and fires the load events.

use super::template::{escape_text, fill};
use crate::error::Result;
use regex::Regex;
use std::sync::OnceLock;

const INTERACTIVE_TEMPLATE: &str = include_str!("templates/interactive.html");

/// Build the interactive document around `code`
pub fn build_interactive_document(code: &str, title: &str) -> Result<String> {
    let script = escape_script_close(code);
    fill(
        INTERACTIVE_TEMPLATE,
        &[("title", &escape_text(title)), ("script", &script)],
    )
}

/// Keep `</script` inside the code from closing the embedding element
fn escape_script_close(code: &str) -> String {
    static SCRIPT_CLOSE: OnceLock<Regex> = OnceLock::new();
    let script_close = SCRIPT_CLOSE
        .get_or_init(|| Regex::new(r"(?i)</(script)").expect("script close pattern is valid"));
    script_close.replace_all(code, "<\\/$1").into_owned()
}
