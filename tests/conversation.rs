use hoopchat::config::Config;
use hoopchat::service::HttpQueryService;
use hoopchat::ui::conversation::ConversationManager;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answer a single HTTP request with `status` and a JSON `body`; the task
/// resolves to the raw request that was received.
async fn serve_once(status: &'static str, body: serde_json::Value) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let body = body.to_string();
        let reply = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn manager_for(base_url: &str, process_enabled: bool) -> ConversationManager {
    let mut config = Config::default();
    config.api_base_url = base_url.to_string();
    config.features.show_process_queries_button = process_enabled;

    let service = HttpQueryService::new(&config).unwrap();
    ConversationManager::new(Arc::new(service), &config)
}

#[tokio::test]
async fn answered_query_carries_table_and_chart() {
    let (base_url, server) = serve_once(
        "200 OK",
        json!({
            "message": "Gonzaga led in wins",
            "tableData": { "columns": ["team", "wins"], "rows": [["Gonzaga", 28], ["Baylor", 26]] },
            "graphData": { "chartType": "bar", "x": ["Gonzaga", "Baylor"], "y": [28, 26] }
        }),
    )
    .await;
    let mut manager = manager_for(&base_url, false);

    manager.edit_draft("most wins in 2021");
    assert!(manager.submit());
    assert!(manager.wait_for_service_event().await);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/chat "));
    assert!(request.contains(r#"{"query":"most wins in 2021"}"#));

    let messages = manager.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[1].is_user);

    let reply = &messages[2];
    assert_eq!(reply.text, "most wins in 2021");
    let response = reply.response.as_ref().unwrap();
    assert_eq!(response.message, "Gonzaga led in wins");
    assert_eq!(response.table.as_ref().unwrap().rows.len(), 2);
    assert_eq!(manager.latest_chart().unwrap().chart_type(), "bar");
}

#[tokio::test]
async fn server_error_message_is_shown() {
    let (base_url, _server) =
        serve_once("500 Internal Server Error", json!({ "message": "Unknown team: Narnia" })).await;
    let mut manager = manager_for(&base_url, false);

    manager.edit_draft("narnia wins");
    manager.submit();
    manager.wait_for_service_event().await;

    assert!(!manager.loading());
    assert_eq!(
        manager.messages().last().unwrap().text,
        "Sorry, I encountered an error: Unknown team: Narnia"
    );
}

#[tokio::test]
async fn nested_error_message_is_used() {
    let (base_url, _server) = serve_once(
        "400 Bad Request",
        json!({ "error": { "message": "query too vague" } }),
    )
    .await;
    let mut manager = manager_for(&base_url, false);

    manager.edit_draft("stats");
    manager.submit();
    manager.wait_for_service_event().await;

    assert_eq!(
        manager.messages().last().unwrap().text,
        "Sorry, I encountered an error: query too vague"
    );
}

#[tokio::test]
async fn processing_summary_is_reported() {
    let (base_url, server) = serve_once(
        "200 OK",
        json!({
            "originalCount": 120,
            "duplicatesRemoved": 20,
            "finalCount": 100,
            "queriesProcessed": 100,
            "queriesSucceeded": 98,
            "queriesFailed": 2,
            "processingTimeMs": 42000,
            "errors": ["q17: timeout", "q88: bad column"]
        }),
    )
    .await;
    let mut manager = manager_for(&base_url, true);

    assert!(manager.process_queries());
    assert!(manager.processing_queries());
    manager.wait_for_service_event().await;
    assert!(!manager.processing_queries());

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/queries/process "));

    let summary = manager.messages().last().unwrap();
    assert!(summary.text.contains("• Original queries: 120\n"));
    assert!(summary.text.contains("• Processing time: 42s"));
    assert!(summary.text.ends_with("1. q17: timeout\n2. q88: bad column\n"));
    assert_eq!(summary.time_taken_ms, Some(42_000));
}

#[tokio::test]
async fn unreachable_service_still_clears_processing() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut manager = manager_for(&base_url, true);
    assert!(manager.process_queries());
    manager.wait_for_service_event().await;

    assert!(!manager.processing_queries());
    assert!(manager
        .messages()
        .last()
        .unwrap()
        .text
        .starts_with("❌ Error processing queries: "));
}
