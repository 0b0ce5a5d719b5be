//! Module syntax simulation
//!
//! The sandbox evaluates classic scripts and has no module loader. Snippets
//! that use `import`/`export` are rewritten so the rest of the code can still
//! run: imports become empty placeholder bindings and export keywords are
//! commented out. The rewrite is line-oriented and lossy.

use crate::classifier::{classify, Classification};
use crate::error::{EngineError, Result};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Name pulled out of a module by an import clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Default,
    Namespace,
    Named(String),
}

/// Local binding introduced in place of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderBinding {
    pub local: String,
    pub imported: ImportedName,
    pub module: String,
}

/// Source after module syntax was simulated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRewrite {
    pub source: String,
    pub bindings: Vec<PlaceholderBinding>,
    /// Modules imported only for their side effects
    pub side_effect_imports: Vec<String>,
    /// Export statements neutralized
    pub exports: usize,
}

fn cached(slot: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    slot.get_or_init(|| Regex::new(pattern).expect("rewrite patterns are valid"))
}

fn module_syntax() -> &'static Regex {
    static MODULE_SYNTAX: OnceLock<Regex> = OnceLock::new();
    cached(
        &MODULE_SYNTAX,
        r#"(?m)^\s*(?:import\s*[\w{*"']|export\b|from\s+[\w.]+\s+import\s)"#,
    )
}

/// True when any line starts with an import or export statement.
/// Dynamic `import(...)` does not count.
pub fn has_module_syntax(code: &str) -> bool {
    module_syntax().is_match(code)
}

/// Module syntax in code that classifies as another language is rejected
/// rather than simulated.
pub fn check_module_syntax(code: &str) -> Result<()> {
    let Some(found) = module_syntax().find(code) else {
        return Ok(());
    };
    if let Classification::OtherLanguage(language) = classify(code) {
        let line_end = code[found.start()..]
            .find('\n')
            .map_or(code.len(), |offset| found.start() + offset);
        return Err(EngineError::CrossLanguageModuleSyntax {
            language,
            syntax: code[found.start()..line_end].trim().to_string(),
        });
    }
    Ok(())
}

/// Replace import/export statements with placeholders.
///
/// Returns `None` when the code has no module syntax.
pub fn rewrite_modules(code: &str) -> Option<ModuleRewrite> {
    static IMPORT_FROM: OnceLock<Regex> = OnceLock::new();
    static SIDE_EFFECT_IMPORT: OnceLock<Regex> = OnceLock::new();
    static EXPORT_DEFAULT: OnceLock<Regex> = OnceLock::new();
    static EXPORT_LIST: OnceLock<Regex> = OnceLock::new();
    static EXPORT_DECLARATION: OnceLock<Regex> = OnceLock::new();

    if !has_module_syntax(code) {
        return None;
    }

    let import_from = cached(
        &IMPORT_FROM,
        r#"(?m)^([ \t]*)import\s+([^;'"]+?)\s+from\s*['"]([^'"\n]+)['"][ \t]*;?"#,
    );
    let side_effect_import = cached(
        &SIDE_EFFECT_IMPORT,
        r#"(?m)^([ \t]*)import\s*['"]([^'"\n]+)['"][ \t]*;?"#,
    );
    let export_default = cached(
        &EXPORT_DEFAULT,
        r"(?m)^([ \t]*)export\s+default\s+((?:async\s+)?function\b\s*\*?\s*[A-Za-z_$]|class\s+[A-Za-z_$])?",
    );
    let export_list = cached(
        &EXPORT_LIST,
        r#"(?m)^([ \t]*)export\s*(\{[^}]*\}(?:\s*from\s*['"][^'"\n]*['"])?|\*(?:\s+as\s+[\w$]+)?\s*from\s*['"][^'"\n]*['"])[ \t]*;?"#,
    );
    let export_declaration = cached(
        &EXPORT_DECLARATION,
        r"(?m)^([ \t]*)export\s+((?:const|let|var|function|class|async)\b)",
    );

    let mut bindings = Vec::new();
    let mut side_effect_imports = Vec::new();
    let mut exports = 0;

    let source = import_from.replace_all(code, |caps: &Captures| {
        let module = caps[3].to_string();
        let before = bindings.len();
        parse_import_clause(&caps[2], &module, &mut bindings);
        let declared: Vec<String> = bindings[before..]
            .iter()
            .map(|binding| format!("{} = {{}}", binding.local))
            .collect();
        if declared.is_empty() {
            format!("{}/* import from {} */", &caps[1], comment_safe(&module))
        } else {
            format!(
                "{}const {}; /* simulated import from {} */",
                &caps[1],
                declared.join(", "),
                comment_safe(&module)
            )
        }
    });

    let source = side_effect_import.replace_all(&source, |caps: &Captures| {
        side_effect_imports.push(caps[2].to_string());
        format!("{}/* import {} */", &caps[1], comment_safe(&caps[2]))
    });

    let source = export_default.replace_all(&source, |caps: &Captures| {
        exports += 1;
        match caps.get(2) {
            Some(declaration) => format!("{}/* export default */ {}", &caps[1], declaration.as_str()),
            None => format!("{}/* export default */ const __defaultExport = ", &caps[1]),
        }
    });

    let source = export_list.replace_all(&source, |caps: &Captures| {
        exports += 1;
        format!("{}/* export {} */", &caps[1], comment_safe(&caps[2]))
    });

    let source = export_declaration.replace_all(&source, |caps: &Captures| {
        exports += 1;
        format!("{}/* export */ {}", &caps[1], &caps[2])
    });

    let mut preamble = vec![console_warn(
        "Module syntax detected: imports are simulated with empty placeholders and no modules are loaded",
    )];
    for binding in &bindings {
        preamble.push(console_warn(&format!(
            "Simulated import '{}' from '{}'",
            binding.local, binding.module
        )));
    }
    for module in &side_effect_imports {
        preamble.push(console_warn(&format!("Skipped side-effect import '{}'", module)));
    }

    Some(ModuleRewrite {
        source: format!("{}\n{}", preamble.join("\n"), source),
        bindings,
        side_effect_imports,
        exports,
    })
}

fn parse_import_clause(clause: &str, module: &str, out: &mut Vec<PlaceholderBinding>) {
    let clause = clause.trim();
    let (head, named) = match clause.find('{') {
        Some(index) => (&clause[..index], Some(&clause[index..])),
        None => (clause, None),
    };

    let mut push = |local: &str, imported: ImportedName| {
        let local = local.trim();
        if is_identifier(local) {
            out.push(PlaceholderBinding {
                local: local.to_string(),
                imported,
                module: module.to_string(),
            });
        }
    };

    for part in head.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.strip_prefix('*') {
            Some(rest) => {
                let rest = rest.trim();
                push(rest.strip_prefix("as").unwrap_or(rest), ImportedName::Namespace);
            }
            None => push(part, ImportedName::Default),
        }
    }

    if let Some(named) = named {
        let inner = named.trim_start_matches('{').trim_end_matches('}');
        for specifier in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let specifier = specifier.strip_prefix("type ").unwrap_or(specifier);
            match specifier.split_once(" as ") {
                Some((imported, local)) => {
                    push(local, ImportedName::Named(imported.trim().to_string()))
                }
                None => push(specifier, ImportedName::Named(specifier.trim().to_string())),
            }
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /")
}

fn console_warn(message: &str) -> String {
    // serde_json string encoding is a valid JS string literal
    let literal = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
    format!("console.warn({});", literal)
}
