//! SQL statement execution against a SQL warehouse.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::info;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::sql_safety::{check_sql_safety, sanitize_sql_for_logging};

const DEFAULT_ROW_LIMIT: u64 = 10_000;
const SAFE_ROW_LIMIT: u64 = 1_000;
// The service caps inline dispositions at 16 MiB.
const INLINE_BYTE_LIMIT: u64 = 16_777_216;

/// Optional execution context for a statement.
#[derive(Debug, Clone, Default)]
pub struct StatementOptions {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub parameters: Option<Value>,
    pub row_limit: Option<u64>,
}

/// Submit a statement for execution with inline JSON results.
///
/// The service waits up to 10 seconds before answering with a pending state;
/// use [`execute_and_wait`] to poll longer-running statements to completion.
pub async fn execute_statement(
    client: &ApiClient,
    statement: &str,
    warehouse_id: &str,
    opts: &StatementOptions,
) -> Result<Value> {
    if statement.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "statement must not be empty".to_string(),
        ));
    }
    if warehouse_id.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "warehouse_id must be provided either as a parameter or via \
             the DATABRICKS_WAREHOUSE_ID environment variable"
                .to_string(),
        ));
    }

    info!(
        statement = %sanitize_sql_for_logging(statement, 200),
        warehouse_id,
        "Executing SQL statement"
    );

    let mut payload = json!({
        "statement": statement,
        "warehouse_id": warehouse_id,
        "wait_timeout": "10s",
        "format": "JSON_ARRAY",
        "disposition": "INLINE",
        "row_limit": opts.row_limit.unwrap_or(DEFAULT_ROW_LIMIT),
        "byte_limit": INLINE_BYTE_LIMIT,
    });
    if let Some(catalog) = &opts.catalog {
        payload["catalog"] = json!(catalog);
    }
    if let Some(schema) = &opts.schema {
        payload["schema"] = json!(schema);
    }
    if let Some(parameters) = &opts.parameters {
        payload["parameters"] = parameters.clone();
    }

    client.post("/api/2.0/sql/statements", &payload).await
}

/// Current state of a previously submitted statement.
pub async fn get_statement_status(client: &ApiClient, statement_id: &str) -> Result<Value> {
    info!(statement_id, "Getting SQL statement status");
    client
        .get(&format!("/api/2.0/sql/statements/{statement_id}"), &[])
        .await
}

/// Cancel a running statement.
pub async fn cancel_statement(client: &ApiClient, statement_id: &str) -> Result<Value> {
    info!(statement_id, "Cancelling SQL statement");
    client
        .post(
            &format!("/api/2.0/sql/statements/{statement_id}/cancel"),
            &json!({}),
        )
        .await
}

/// Execute a statement and poll until it leaves the PENDING/RUNNING states.
///
/// The returned payload is the final statement response. A statement that
/// the warehouse reports as FAILED, CANCELED or CLOSED is surfaced verbatim;
/// deciding what that means is the caller's business.
pub async fn execute_and_wait(
    client: &ApiClient,
    statement: &str,
    warehouse_id: &str,
    opts: &StatementOptions,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Value> {
    let submitted_at = Instant::now();
    let mut response = execute_statement(client, statement, warehouse_id, opts).await?;

    loop {
        let state = response
            .pointer("/status/state")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !matches!(state.as_str(), "PENDING" | "RUNNING") {
            return Ok(response);
        }

        if submitted_at.elapsed() >= timeout {
            return Ok(response);
        }

        let statement_id = response
            .get("statement_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Decode {
                path: "/api/2.0/sql/statements".to_string(),
                message: "statement response missing statement_id".to_string(),
            })?
            .to_string();

        tokio::time::sleep(poll_interval).await;
        response = get_statement_status(client, &statement_id).await?;
    }
}

/// Execute a statement after validating that it is read-only.
///
/// Used for agent-driven queries where a destructive statement must never
/// reach the warehouse. The row limit is tightened accordingly.
pub async fn execute_safe_statement(
    client: &ApiClient,
    statement: &str,
    warehouse_id: &str,
    opts: &StatementOptions,
) -> Result<Value> {
    check_sql_safety(statement, true)
        .map_err(|err| ApiError::InvalidInput(err.message))?;
    info!("SQL safety validation passed");

    let mut limited = opts.clone();
    limited.row_limit = Some(limited.row_limit.unwrap_or(SAFE_ROW_LIMIT).min(SAFE_ROW_LIMIT));
    execute_statement(client, statement, warehouse_id, &limited).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), "t").unwrap()
    }

    #[tokio::test]
    async fn missing_warehouse_rejected_before_any_request() {
        let server = MockServer::start().await;
        let err = execute_statement(
            &test_client(&server),
            "SELECT 1",
            "",
            &StatementOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn execute_and_wait_polls_until_succeeded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/statements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statement_id": "st-1",
                "status": {"state": "PENDING"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/sql/statements/st-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statement_id": "st-1",
                "status": {"state": "RUNNING"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/sql/statements/st-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statement_id": "st-1",
                "status": {"state": "SUCCEEDED"},
                "result": {"data_array": [["1"]]}
            })))
            .mount(&server)
            .await;

        let response = execute_and_wait(
            &test_client(&server),
            "SELECT 1",
            "wh-1",
            &StatementOptions::default(),
            Duration::from_secs(2),
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert_eq!(
            response.pointer("/status/state").and_then(Value::as_str),
            Some("SUCCEEDED")
        );
    }

    #[tokio::test]
    async fn safe_execution_blocks_destructive_sql() {
        let server = MockServer::start().await;
        let err = execute_safe_statement(
            &test_client(&server),
            "DROP TABLE sales.orders",
            "wh-1",
            &StatementOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
