//! Multi-step editing sessions

use crate::common::{fresh_session, setup_test_logging, test_config, test_engine};
use std::sync::Arc;
use workbench_engine::{ExecutionRequest, Language, SessionId, WorkbenchEngine};

#[tokio::test]
async fn test_edit_session_workflow() {
    let engine = test_engine();
    let session = fresh_session();

    let page = engine
        .execute(
            ExecutionRequest::new("<main><button class=\"cta\">Go</button></main>", "html")
                .in_session(session.clone()),
        )
        .await;
    assert!(page.success);

    let styled = engine
        .execute(ExecutionRequest::new(".cta { padding: 8px; }", "css").in_session(session.clone()))
        .await;
    assert!(styled.document_content.unwrap().contains("class=\"cta\""));

    let script = engine
        .execute(
            ExecutionRequest::new("const label = 'Go'; label.length", "javascript")
                .in_session(session.clone()),
        )
        .await;
    assert_eq!(script.output, "Result: 2");

    let state = engine.sessions().snapshot(&session).await.unwrap();
    assert!(state.markup_mode);
    assert_eq!(
        state.last_markup.as_deref(),
        Some("<main><button class=\"cta\">Go</button></main>")
    );
    assert_eq!(state.last_script_output.as_deref(), Some("Result: 2"));
    assert!(state.last_timestamp.is_some());

    // A fresh start forgets the markup
    assert!(engine.end_session(&session).await);
    let gallery = engine
        .execute(ExecutionRequest::new(".cta { padding: 8px; }", "css").in_session(session.clone()))
        .await;
    assert!(gallery.document_content.unwrap().contains("workbench-gallery"));
}

#[tokio::test]
async fn test_concurrent_sessions() {
    setup_test_logging();
    let engine = Arc::new(WorkbenchEngine::new(test_config()));

    let mut handles = Vec::new();
    for i in 0..4 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let session = SessionId::from(format!("session-{}", i).as_str());
            engine
                .execute_code(&session, &format!("<p>page {}</p>", i), "html")
                .await;
            let styled = engine
                .execute_code(&session, "p { color: navy; }", "css")
                .await;
            let script = engine
                .execute_code(&session, &format!("console.log({} * 10)", i), "javascript")
                .await;
            (i, styled, script)
        }));
    }

    for handle in handles {
        let (i, styled, script) = handle.await.unwrap();
        let document = styled.document_content.unwrap();
        assert!(document.contains(&format!("<p>page {}</p>", i)));
        assert_eq!(styled.language, Some(Language::Style));
        assert_eq!(script.output, (i * 10).to_string());
    }
    assert_eq!(engine.sessions().len().await, 4);
}

#[tokio::test]
async fn test_same_session_calls_serialize() {
    let engine = Arc::new(test_engine());
    let session = fresh_session();
    engine.execute_code(&session, "<p>base</p>", "html").await;

    let (a, b) = tokio::join!(
        engine.execute_code(&session, "p { color: red; }", "css"),
        engine.execute_code(&session, "p { color: blue; }", "css"),
    );
    assert!(a.success && b.success);

    // Whichever ran last owns the carried style
    let state = engine.sessions().snapshot(&session).await.unwrap();
    let composed = state.last_composed.unwrap();
    assert_eq!(
        composed.contains("color: red") as u8 + composed.contains("color: blue") as u8,
        1
    );
}
