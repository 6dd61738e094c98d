//! End-to-end dispatch tests: JSON-RPC frames through the server core into
//! SDK calls against a mock Databricks workspace.

#![allow(clippy::unwrap_used, clippy::panic)]

use dbmcp_mcp::{build_server, AppContext, McpServer};
use dbmcp_sdk::{ApiClient, Settings};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_against(mock: &MockServer) -> McpServer<AppContext> {
    let settings = Settings {
        host: mock.uri(),
        token: "dapi-test".to_string(),
        warehouse_id: Some("wh-default-1".to_string()),
    };
    let client = ApiClient::from_settings(&settings).unwrap();
    build_server(AppContext::new(client, settings))
}

async fn call_tool(server: &McpServer<AppContext>, name: &str, arguments: Value) -> Value {
    let frame = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let response = server.handle_message(&frame.to_string()).await.unwrap();
    serde_json::from_str(&response).unwrap()
}

#[tokio::test]
async fn tools_list_covers_the_full_catalog() {
    let mock = MockServer::start().await;
    let server = server_against(&mock).await;

    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&response).unwrap();
    let tools = value["result"]["tools"].as_array().unwrap();

    assert_eq!(tools.len(), 43);
    for expected in [
        "list_clusters",
        "run_notebook",
        "execute_sql",
        "list_genie_spaces",
        "start_genie_conversation",
        "send_genie_followup",
        "get_genie_message_status",
        "get_genie_query_results",
    ] {
        assert!(
            tools.iter().any(|t| t["name"] == expected),
            "missing tool {expected}"
        );
    }
}

#[tokio::test]
async fn list_clusters_tool_forwards_to_the_api() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/2.0/clusters/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clusters": [{"cluster_id": "c-1", "state": "RUNNING"}]
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let value = call_tool(&server, "list_clusters", json!({})).await;

    assert_eq!(value["result"]["isError"], false);
    let text = value["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("c-1"));
}

#[tokio::test]
async fn execute_sql_falls_back_to_configured_warehouse() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/2.0/sql/statements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "st-1",
            "status": {"state": "SUCCEEDED"}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let value = call_tool(&server, "execute_sql", json!({"statement": "SELECT 1"})).await;
    assert_eq!(value["result"]["isError"], false);

    // The configured default warehouse went out on the wire.
    let requests = mock.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["warehouse_id"], "wh-default-1");
}

#[tokio::test]
async fn read_only_sql_is_blocked_before_reaching_the_warehouse() {
    let mock = MockServer::start().await;
    let server = server_against(&mock).await;

    let value = call_tool(
        &server,
        "execute_sql",
        json!({"statement": "DROP TABLE sales.orders", "read_only": true}),
    )
    .await;

    assert_eq!(value["result"]["isError"], true);
    let text = value["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("DROP"));
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn genie_conversation_drives_poll_loop_through_the_tool_layer() {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
        .and(body_json(json!({"content": "top 5 products by revenue"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv-1",
            "message_id": "m-1"
        })))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m-1",
            "status": "COMPLETED",
            "attachments": [{"id": "att-1", "query": {"query": "SELECT 1"}}]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1/query-result/att-1",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data_array": [["1"]]})),
        )
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let value = call_tool(
        &server,
        "start_genie_conversation",
        json!({
            "space_id": "sp1",
            "question": "top 5 products by revenue",
            "poll_interval_seconds": 0.01,
            "max_wait_seconds": 1.0
        }),
    )
    .await;

    assert_eq!(value["result"]["isError"], false);
    let text = value["result"]["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["status"], "completed");
    assert_eq!(payload["conversation_id"], "conv-1");
    assert_eq!(payload["sql_text"], "SELECT 1");
}

#[tokio::test]
async fn genie_remote_failure_is_a_payload_not_a_tool_error() {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv-1",
            "message_id": "m-1",
            "status": "FAILED",
            "error": {"message": "no tables matched"}
        })))
        .mount(&mock)
        .await;

    let server = server_against(&mock).await;
    let value = call_tool(
        &server,
        "start_genie_conversation",
        json!({"space_id": "sp1", "question": "what?"}),
    )
    .await;

    assert_eq!(value["result"]["isError"], false);
    let text = value["result"]["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["status"], "failed");
    assert_eq!(payload["error_detail"], "no tables matched");
}

#[tokio::test]
async fn unknown_tool_is_a_protocol_error() {
    let mock = MockServer::start().await;
    let server = server_against(&mock).await;

    let value = call_tool(&server, "definitely_not_a_tool", json!({})).await;
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unknown tool"));
}
