//! Classification, reconciliation and routing

use crate::common::{fresh_session, test_engine};
use assert_matches::assert_matches;
use workbench_engine::{classify, Classification, ExecutionRequest, Language};

#[tokio::test]
async fn test_dom_script_gets_interactive_preview() {
    let engine = test_engine();
    let code = "document.getElementById('x').addEventListener('click', () => console.log('clicked'));";
    let result = engine.execute_code(&fresh_session(), code, "javascript").await;

    assert!(result.success);
    assert!(result.is_document);
    assert_matches!(result.language, Some(Language::Script));
    let document = result.document_content.unwrap();
    assert!(document.contains(code));
    assert!(document.contains("console-output"));
}

#[tokio::test]
async fn test_unsupported_declaration_uses_detection() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), "<div><p>hello</p></div>", "ruby")
        .await;

    assert!(result.success);
    assert_matches!(result.language, Some(Language::Markup));
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("ruby"));
}

#[tokio::test]
async fn test_both_unsupported_fails() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), "def main():\n    print('hi')", "python")
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Unsupported language 'python'"));
    assert_eq!(result.language, None);
}

#[tokio::test]
async fn test_supported_declaration_wins_with_warning() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), ".card { padding: 4px; }", "html")
        .await;

    assert!(result.success);
    assert_matches!(result.language, Some(Language::Markup));
    assert!(result.warnings[0].contains("css"));
}

#[tokio::test]
async fn test_cross_language_module_syntax_rejected() {
    let engine = test_engine();
    let result = engine
        .execute_code(&fresh_session(), "import os\nprint(os.getcwd())", "javascript")
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("python"), "{}", error);
    assert!(error.contains("import os"), "{}", error);
}

#[tokio::test]
async fn test_result_serializes_camel_case() {
    let engine = test_engine();
    let result = engine
        .execute(ExecutionRequest::new("<p>x</p>", "html").in_session(fresh_session()))
        .await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["isDocument"], true);
    assert!(value["documentContent"].as_str().unwrap().contains("<p>x</p>"));
    assert_eq!(value["language"], "html");
    assert!(value.get("durationMs").is_some());
    assert!(value.get("warnings").is_none());
}

#[test]
fn test_classify_is_deterministic() {
    let samples = [
        "const a = 1;",
        "<!DOCTYPE html><html></html>",
        "@media (max-width: 600px) { body { margin: 0; } }",
        "def f():\n    pass",
        "just some words",
    ];
    for sample in samples {
        assert_eq!(classify(sample), classify(sample));
    }
    assert_eq!(classify("just some words"), Classification::Unknown);
}
