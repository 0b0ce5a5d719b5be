//! Script execution through the public engine API

use crate::common::{fresh_session, test_engine};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_console_log_expression() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), "console.log(1+1)", "javascript")
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.output, "2");
    assert!(!result.is_document);
}

#[tokio::test]
async fn test_completion_value_is_reported() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), "const total = [1, 2, 3].reduce((a, b) => a + b, 0);\ntotal * 2", "js")
        .await;

    assert!(result.success);
    assert_eq!(result.output, "Result: 12");
}

#[tokio::test]
async fn test_simulated_import() {
    let engine = test_engine();
    let result = engine
        .execute_code(
            &fresh_session(),
            "import { x } from \"y\"; console.log(typeof x)",
            "javascript",
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    let lines: Vec<&str> = result.output.lines().collect();
    assert!(lines[0].starts_with("[warn] Module syntax detected"));
    assert_eq!(lines[1], "[warn] Simulated import 'x' from 'y'");
    assert_eq!(lines.last(), Some(&"object"));
}

#[tokio::test]
async fn test_throwing_interval_fires_once() {
    let engine = test_engine();
    let result = engine
        .execute_code(
            &fresh_session(),
            "let calls = 0;\nsetInterval(() => { calls += 1; console.log('tick ' + calls); throw new Error('stop'); }, 10);",
            "javascript",
        )
        .await;

    assert!(result.success);
    assert_eq!(
        result.output,
        "tick 1\n[error] Error in setInterval callback: Error: stop (interval cleared)"
    );
}

#[tokio::test]
async fn test_long_timeout_is_clamped() {
    let engine = test_engine();
    let result = engine
        .execute_code(
            &fresh_session(),
            "setTimeout(() => console.log('fired'), 60000);",
            "javascript",
        )
        .await;

    assert!(result.success);
    assert_eq!(result.output, "fired");
}

#[tokio::test]
async fn test_infinite_loop_is_bounded() {
    let engine = test_engine();
    let start = Instant::now();
    let result = engine
        .execute_code(
            &fresh_session(),
            "console.log('spinning');\nwhile (true) {}",
            "javascript",
        )
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Execution timed out after 1000ms")
    );
    assert_eq!(result.output, "spinning");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_syntax_error_fails_cleanly() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), "const = ;", "javascript")
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.starts_with("SyntaxError"), "{}", error);
}

#[tokio::test]
async fn test_unhandled_rejection_is_reported() {
    let engine = test_engine();
    let result = engine
        .execute_code(
            &fresh_session(),
            "Promise.reject(new Error('nope'));",
            "javascript",
        )
        .await;

    let combined = format!("{} {}", result.output, result.error.unwrap_or_default());
    assert!(combined.contains("nope"), "{}", combined);
}

#[tokio::test]
async fn test_host_surface_is_inert() {
    let engine = test_engine();
    let result = engine
        .execute_code(
            &fresh_session(),
            "alert('hi');\nconsole.log(confirm('sure?'), prompt('name?'), sessionStorage.getItem('k'));\nconsole.log(typeof process, typeof Deno);",
            "javascript",
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.output,
        "[alert] hi\nfalse null null\nundefined undefined"
    );
}
