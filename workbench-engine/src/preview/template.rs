//! `{{name}}` placeholder filling for the bundled document templates

use crate::error::{EngineError, Result};

/// Substitute every `{{name}}` in `template` with its value.
///
/// Values are inserted verbatim and never rescanned, so user code containing
/// `{{` is safe. A placeholder without a value is an error.
pub fn fill(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            return Err(EngineError::DocumentParse(
                "unterminated template placeholder".to_string(),
            ));
        };
        let name = after[..close].trim();
        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                EngineError::DocumentParse(format!("template placeholder '{}' has no value", name))
            })?;
        out.push_str(value);
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Escape text for use inside an element or attribute
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
