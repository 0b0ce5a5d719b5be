//! Language detection and declared/detected reconciliation

use crate::error::{EngineError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of leading lines inspected by [`classify`]
const SCAN_LINES: usize = 10;

/// Languages the engine can execute or preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "javascript")]
    Script,
    #[serde(rename = "html")]
    Markup,
    #[serde(rename = "css")]
    Style,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Script => "javascript",
            Language::Markup => "html",
            Language::Style => "css",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language tag supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeclaredLanguage {
    Supported(Language),
    Other(String),
}

impl DeclaredLanguage {
    /// Parse a free-form editor language tag
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "javascript" | "js" | "mjs" | "cjs" | "jsx" | "script" => {
                DeclaredLanguage::Supported(Language::Script)
            }
            "html" | "htm" | "xhtml" | "markup" => DeclaredLanguage::Supported(Language::Markup),
            "css" | "style" => DeclaredLanguage::Supported(Language::Style),
            _ => DeclaredLanguage::Other(tag),
        }
    }

    pub fn supported(&self) -> Option<Language> {
        match self {
            DeclaredLanguage::Supported(language) => Some(*language),
            DeclaredLanguage::Other(_) => None,
        }
    }
}

impl From<String> for DeclaredLanguage {
    fn from(tag: String) -> Self {
        DeclaredLanguage::parse(&tag)
    }
}

impl From<DeclaredLanguage> for String {
    fn from(declared: DeclaredLanguage) -> Self {
        declared.to_string()
    }
}

impl fmt::Display for DeclaredLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredLanguage::Supported(language) => write!(f, "{}", language),
            DeclaredLanguage::Other(tag) => f.write_str(tag),
        }
    }
}

/// Best guess about what a snippet is written in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Script,
    Markup,
    Style,
    OtherLanguage(String),
    Unknown,
}

impl Classification {
    pub fn language(&self) -> Option<Language> {
        match self {
            Classification::Script => Some(Language::Script),
            Classification::Markup => Some(Language::Markup),
            Classification::Style => Some(Language::Style),
            Classification::OtherLanguage(_) | Classification::Unknown => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Script => f.write_str("javascript"),
            Classification::Markup => f.write_str("html"),
            Classification::Style => f.write_str("css"),
            Classification::OtherLanguage(name) => f.write_str(name),
            Classification::Unknown => f.write_str("unknown"),
        }
    }
}

fn cached(slot: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    slot.get_or_init(|| Regex::new(pattern).expect("classifier patterns are valid"))
}

fn script_patterns() -> [&'static Regex; 6] {
    static FUNCTION: OnceLock<Regex> = OnceLock::new();
    static BINDING: OnceLock<Regex> = OnceLock::new();
    static IMPORT_FROM: OnceLock<Regex> = OnceLock::new();
    static EXPORT: OnceLock<Regex> = OnceLock::new();
    static ARROW: OnceLock<Regex> = OnceLock::new();
    static CLASS: OnceLock<Regex> = OnceLock::new();
    [
        cached(&FUNCTION, r"\bfunction\b"),
        cached(&BINDING, r"\b(?:const|let)\s+[A-Za-z_$\[{]"),
        cached(&IMPORT_FROM, r"(?m)^\s*import\s.+\sfrom\s"),
        cached(&EXPORT, r"(?m)^\s*export\s"),
        cached(&ARROW, r"=>"),
        cached(&CLASS, r"\bclass\s+[A-Za-z_$][\w$]*(?:\s+extends\s+[\w$.]+)?\s*\{"),
    ]
}

fn style_patterns() -> [&'static Regex; 4] {
    static RULE_BLOCK: OnceLock<Regex> = OnceLock::new();
    static LENGTH_UNIT: OnceLock<Regex> = OnceLock::new();
    static MEDIA: OnceLock<Regex> = OnceLock::new();
    static CLASS_SELECTOR: OnceLock<Regex> = OnceLock::new();
    [
        cached(&RULE_BLOCK, r"\{[^{}]*\}"),
        cached(&LENGTH_UNIT, r"\d(?:px|em|rem)\b"),
        cached(&MEDIA, r"@media\b"),
        cached(&CLASS_SELECTOR, r"(?m)^\s*\.[A-Za-z_-][\w-]*[^{\n]*\{"),
    ]
}

fn other_script_patterns() -> [&'static Regex; 4] {
    static DEF: OnceLock<Regex> = OnceLock::new();
    static BARE_IMPORT: OnceLock<Regex> = OnceLock::new();
    static PRINT: OnceLock<Regex> = OnceLock::new();
    static MAIN_GUARD: OnceLock<Regex> = OnceLock::new();
    [
        cached(&DEF, r"(?m)^\s*def\s"),
        cached(&BARE_IMPORT, r"(?m)^\s*(?:import\s+[\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+)*\s*$|from\s+[\w.]+\s+import\s)"),
        cached(&PRINT, r"\bprint\("),
        cached(&MAIN_GUARD, r#"__name__\s*==\s*['"]__main__['"]"#),
    ]
}

/// Classify `code` by looking at its first lines. Pure and deterministic.
pub fn classify(code: &str) -> Classification {
    let head: String = code.lines().take(SCAN_LINES).collect::<Vec<_>>().join("\n");

    if script_patterns().iter().any(|re| re.is_match(&head)) {
        return Classification::Script;
    }

    let lowered = head.to_ascii_lowercase();
    if lowered.contains("<html") || lowered.contains("<!doctype html") || has_matched_tag_pair(&lowered) {
        return Classification::Markup;
    }

    let [rule_block, length_unit, media, class_selector] = style_patterns();
    if (rule_block.is_match(&head) && length_unit.is_match(&head))
        || media.is_match(&head)
        || class_selector.is_match(&head)
    {
        return Classification::Style;
    }

    if other_script_patterns().iter().any(|re| re.is_match(&head)) {
        return Classification::OtherLanguage("python".to_string());
    }

    Classification::Unknown
}

/// True when an opening tag is later closed by the same tag name (`<p>..</p>`).
fn has_matched_tag_pair(lowered: &str) -> bool {
    static OPEN_TAG: OnceLock<Regex> = OnceLock::new();
    let open_tag = cached(&OPEN_TAG, r"<([a-z][a-z0-9-]*)(?:\s[^<>]*)?>");

    open_tag.captures_iter(lowered).any(|caps| {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return false;
        };
        lowered[whole.end()..].contains(&format!("</{}>", name.as_str()))
    })
}

/// Outcome of reconciling the declared language with the detected one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub language: Language,
    pub detected: Classification,
    /// Set when declared and detected disagree
    pub warning: Option<String>,
}

/// Decide which pipeline runs a request.
///
/// A supported declared language always wins; an unsupported one is replaced
/// by a supported detection. Fails only when neither side is executable.
pub fn reconcile(declared: &DeclaredLanguage, code: &str) -> Result<Resolution> {
    let detected = classify(code);

    match (declared.supported(), detected.language()) {
        (Some(language), detected_language) => {
            let warning = match (&detected, detected_language) {
                (_, Some(found)) if found != language => Some(mismatch(declared, &detected)),
                (Classification::OtherLanguage(_), None) => Some(mismatch(declared, &detected)),
                _ => None,
            };
            Ok(Resolution {
                language,
                detected,
                warning,
            })
        }
        (None, Some(found)) => Ok(Resolution {
            language: found,
            warning: Some(format!(
                "Declared language '{}' is not executable; running as detected {}",
                declared, found
            )),
            detected,
        }),
        (None, None) => Err(EngineError::UnsupportedLanguage {
            declared: declared.to_string(),
        }),
    }
}

fn mismatch(declared: &DeclaredLanguage, detected: &Classification) -> String {
    format!(
        "Declared language '{}' but the code looks like {}",
        declared, detected
    )
}

/// Script that touches the DOM gets an interactive preview instead of a headless run.
pub fn is_dom_oriented(code: &str) -> bool {
    const DOM_IDIOMS: [&str; 4] = [
        "getElementById",
        "addEventListener",
        "querySelector",
        "createElement",
    ];
    DOM_IDIOMS.iter().any(|idiom| code.contains(idiom))
}
