//! Common test utilities shared across integration and E2E tests

use std::time::Duration;
use workbench_engine::{EngineConfig, SandboxLimits, SessionId, WorkbenchEngine};

/// Setup logging for tests
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Engine with strict sandbox limits so runaway scripts fail fast
pub fn test_engine() -> WorkbenchEngine {
    setup_test_logging();
    WorkbenchEngine::new(test_config())
}

pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.sandbox = SandboxLimits::strict();
    config.sessions.idle_ttl = Duration::from_secs(60);
    config
}

/// A session no other test shares
pub fn fresh_session() -> SessionId {
    SessionId::new()
}
