// Common test utilities shared across test files

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use custom_uploader::{FunctionRegistry, NameParser, NameParserType, TemplateCompiler};

/// Compiler over the built-in functions
#[allow(dead_code)]
pub fn compiler() -> TemplateCompiler {
    TemplateCompiler::new(Arc::new(FunctionRegistry::new()))
}

/// Name parser pinned to 2024-03-05 14:07:09.045 UTC
#[allow(dead_code)]
pub fn fixed_names() -> NameParser {
    let time: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339("2024-03-05T14:07:09.045+00:00").unwrap();
    NameParser::new(NameParserType::Text).with_fixed_time(time)
}

/// Serve `router` on an ephemeral local port and return its base URL
#[allow(dead_code)]
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });

    format!("http://{}", addr)
}
