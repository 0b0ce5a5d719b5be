//! CLI command implementations

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use workbench_engine::{classify, EngineConfig, ExecutionResult, SessionId, WorkbenchEngine};

/// Options for `workbench run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub lang: Option<String>,
    pub session: String,
    pub json: bool,
    pub out: Option<PathBuf>,
}

/// Load the engine config from `path`, or defaults plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let mut config = EngineConfig::default();
            config
                .apply_env_overrides()
                .context("Invalid environment override")?;
            Ok(config)
        }
    }
}

/// Language tag implied by a file extension
pub fn language_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("js" | "mjs" | "cjs" | "jsx") => "javascript",
        Some("html" | "htm" | "xhtml") => "html",
        Some("css") => "css",
        _ => "unknown",
    }
}

/// Execute files in order within one session
pub async fn execute_run(config: EngineConfig, files: &[PathBuf], options: &RunOptions) -> Result<()> {
    let engine = WorkbenchEngine::new(config);
    let session = SessionId::from(options.session.as_str());
    let mut failures = 0;
    let mut last_document = None;

    for path in files {
        let code = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let language = options.lang.as_deref().unwrap_or_else(|| language_for(path));
        debug!(file = %path.display(), language, "Running file");

        let result = engine.execute_code(&session, &code, language).await;
        if !result.success {
            failures += 1;
        }

        if options.json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            print_result(path, &result, options.out.is_none());
        }
        if let Some(document) = result.document_content {
            last_document = Some(document);
        }
    }

    if let (Some(out), Some(document)) = (&options.out, &last_document) {
        std::fs::write(out, document)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!(path = %out.display(), "Wrote document");
    }

    if failures > 0 {
        bail!("{} of {} files failed", failures, files.len());
    }
    Ok(())
}

fn print_result(path: &Path, result: &ExecutionResult, print_document: bool) {
    for warning in &result.warnings {
        eprintln!("warning: {}: {}", path.display(), warning);
    }
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    if let Some(error) = &result.error {
        eprintln!("error: {}: {}", path.display(), error);
    }
    if print_document {
        if let Some(document) = &result.document_content {
            println!("{}", document);
        }
    }
}

/// Print the detected language of each file
pub fn execute_classify(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let code = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        println!("{}\t{}", path.display(), classify(&code));
    }
    Ok(())
}
