//! Session example - run a script, render markup, then restyle it

use workbench_engine::{EngineConfig, SessionId, WorkbenchEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let engine = WorkbenchEngine::new(EngineConfig::default());
    let session = SessionId::from("example");

    println!("=== Workbench Session Example ===\n");

    println!("Step 1: JavaScript");
    let result = engine
        .execute_code(
            &session,
            "const squares = [1, 2, 3].map(n => n * n);\nconsole.log(squares);\nsetTimeout(() => console.log('later'), 500);",
            "javascript",
        )
        .await;
    println!("{}\n", result.output);

    println!("Step 2: HTML");
    let result = engine
        .execute_code(&session, "<h1>Hello</h1>\n<p class=\"lead\">From the workbench</p>", "html")
        .await;
    println!("{}\n", result.output);

    println!("Step 3: CSS against the previous HTML");
    let result = engine
        .execute_code(&session, ".lead { color: teal; font-size: 18px; }", "css")
        .await;
    println!("{}", result.output);
    if let Some(document) = result.document_content {
        println!("{}", document);
    }

    Ok(())
}
