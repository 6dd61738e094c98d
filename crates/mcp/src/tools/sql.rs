//! SQL execution tool.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::forward;
use dbmcp_sdk::sql::{self, StatementOptions};

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ExecuteSqlArgs {
    pub statement: String,
    /// SQL warehouse to run against; falls back to DATABRICKS_WAREHOUSE_ID.
    #[serde(default)]
    pub warehouse_id: Option<String>,
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    /// Reject anything that is not a read-only SELECT before execution.
    #[serde(default)]
    pub read_only: bool,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server.tool(
        "execute_sql",
        "Execute a SQL statement with parameters: statement (required), warehouse_id \
         (optional - uses DATABRICKS_WAREHOUSE_ID env var if not provided), catalog \
         (optional), schema (optional), read_only (optional - validate the statement is \
         a read-only query before executing)",
        execute_sql_tool,
    )
}

async fn execute_sql_tool(ctx: Arc<AppContext>, args: ExecuteSqlArgs) -> ToolResult {
    let warehouse_id = args
        .warehouse_id
        .as_deref()
        .or(ctx.settings.warehouse_id.as_deref())
        .unwrap_or_default()
        .to_string();

    let opts = StatementOptions {
        catalog: args.catalog,
        schema: args.schema,
        parameters: args.parameters,
        row_limit: None,
    };

    let result = if args.read_only {
        sql::execute_safe_statement(&ctx.client, &args.statement, &warehouse_id, &opts).await
    } else {
        sql::execute_statement(&ctx.client, &args.statement, &warehouse_id, &opts).await
    };
    forward("Error executing SQL", result)
}
