//! Markup and style composition within a session

use crate::common::{fresh_session, test_engine};

#[tokio::test]
async fn test_style_applies_to_previous_markup() {
    let engine = test_engine();
    let session = fresh_session();

    let markup = engine.execute_code(&session, "<p>hi</p>", "html").await;
    assert!(markup.success);

    let styled = engine.execute_code(&session, "p { color: red; }", "css").await;
    assert!(styled.success, "{:?}", styled.error);
    assert!(styled.is_document);
    let document = styled.document_content.unwrap();
    assert!(document.contains("<p>hi</p>"));
    assert!(document.contains("p { color: red; }"));
    assert!(!document.contains("workbench-gallery"));
}

#[tokio::test]
async fn test_style_without_markup_renders_gallery() {
    let engine = test_engine();
    let rule = ".card { border-radius: 12px; }";
    let result = engine.execute_code(&fresh_session(), rule, "css").await;

    assert!(result.success);
    let document = result.document_content.unwrap();
    assert!(document.starts_with("<!DOCTYPE html>"));
    assert!(document.contains(rule));
    assert!(document.contains("workbench-gallery"));
    assert!(document.contains("<select>"));
}

#[tokio::test]
async fn test_markup_render_is_idempotent() {
    let engine = test_engine();
    let session = fresh_session();

    let first = engine.execute_code(&session, "<h1>Title</h1>", "html").await;
    let second = engine.execute_code(&session, "<h1>Title</h1>", "html").await;
    assert_eq!(first.document_content, second.document_content);
}

#[tokio::test]
async fn test_style_is_carried_into_later_markup() {
    let engine = test_engine();
    let session = fresh_session();

    engine.execute_code(&session, "<p>one</p>", "html").await;
    let styled = engine.execute_code(&session, "p { margin: 2em; }", "css").await;
    let rerendered = engine.execute_code(&session, "<p>one</p>", "html").await;
    assert_eq!(styled.document_content, rerendered.document_content);

    let other = engine.execute_code(&session, "<p>two</p>", "html").await;
    let document = other.document_content.unwrap();
    assert!(document.contains("<p>two</p>"));
    assert_eq!(document.matches("p { margin: 2em; }").count(), 1);
}

#[tokio::test]
async fn test_sessions_do_not_compose() {
    let engine = test_engine();
    engine.execute_code(&fresh_session(), "<p>mine</p>", "html").await;

    let result = engine
        .execute_code(&fresh_session(), "p { color: red; }", "css")
        .await;
    let document = result.document_content.unwrap();
    assert!(document.contains("workbench-gallery"));
    assert!(!document.contains("mine"));
}

#[tokio::test]
async fn test_invalid_style_fails_without_touching_state() {
    let engine = test_engine();
    let session = fresh_session();
    engine.execute_code(&session, "<p>hi</p>", "html").await;
    let before = engine.sessions().snapshot(&session).await;

    let broken = engine.execute_code(&session, "p { color: red;", "css").await;
    assert!(!broken.success);
    assert!(broken.error.unwrap().starts_with("CSS syntax error"));
    assert_eq!(engine.sessions().snapshot(&session).await, before);

    let fixed = engine.execute_code(&session, "p { color: red; }", "css").await;
    assert!(fixed.document_content.unwrap().contains("<p>hi</p>"));
}

#[tokio::test]
async fn test_full_document_keeps_its_head() {
    let engine = test_engine();
    let session = fresh_session();
    engine.execute_code(&session, "<p>x</p>", "html").await;
    engine.execute_code(&session, "p { color: green; }", "css").await;

    let result = engine
        .execute_code(
            &session,
            "<!DOCTYPE html><html><head><title>Own</title></head><body><p>y</p></body></html>",
            "html",
        )
        .await;
    let document = result.document_content.unwrap();
    assert!(document.contains("<title>Own</title>"));
    assert!(document.contains("p { color: green; }"));
}

#[tokio::test]
async fn test_style_applies_to_document_without_head() {
    let engine = test_engine();
    let session = fresh_session();
    engine
        .execute_code(&session, "<html><body><p>bare</p></body></html>", "html")
        .await;

    let styled = engine.execute_code(&session, "p { color: red; }", "css").await;
    assert!(styled.success);
    assert_eq!(styled.output, "CSS applied to the current HTML preview");
    let document = styled.document_content.unwrap();
    assert!(document.contains("<p>bare</p>"));
    assert!(document.contains("p { color: red; }"));
}
