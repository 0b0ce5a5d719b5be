//! Workbench engine - code execution and preview for editor snippets
//!
//! Classifies a snippet as JavaScript, HTML or CSS, runs scripts in a
//! sandboxed V8 isolate with stand-in browser globals, and renders markup and
//! stylesheets into standalone documents. Markup and style submitted in the
//! same session compose: a stylesheet restyles the last rendered markup.

mod classifier;
mod config;
mod error;
mod executor;
mod host;
mod limits;
mod policy;
mod preview;
mod rewrite;
mod runtime;
mod service;
mod state;
mod types;

pub use classifier::{
    classify, is_dom_oriented, reconcile, Classification, DeclaredLanguage, Language, Resolution,
};
pub use config::{EngineConfig, PreviewConfig, SessionConfig};
pub use error::{EngineError, Result};
pub use executor::{PreparedScript, ScriptExecutor};
pub use host::{
    BufferedConsole, ConsoleLevel, ConsoleSink, DocumentStub, ElementDescriptor, ElementLookup,
    HostSurface, InertDocument, InertWindow, StorageArea, WindowStub,
};
pub use limits::{LoadEventMode, SandboxLimits};
pub use policy::CapabilityPolicy;
pub use preview::{
    build_interactive_document, check_style_syntax, DocumentEngine, Html5everEngine,
    MarkupRenderer, StylePreviewer,
};
pub use rewrite::{
    check_module_syntax, has_module_syntax, rewrite_modules, ImportedName, ModuleRewrite,
    PlaceholderBinding,
};
pub use runtime::v8::{create_host_extension, HostFactory};
pub use runtime::{SandboxReport, ScriptRuntime, V8Runtime};
pub use service::{ExecutionId, WorkbenchEngine};
pub use state::{ExecutionState, SessionId, SessionStore};
pub use types::{ExecutionRequest, ExecutionResult};
