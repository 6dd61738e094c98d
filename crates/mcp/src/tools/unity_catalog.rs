//! Unity Catalog tools.

use std::sync::Arc;

use serde::Deserialize;

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::{forward, EmptyArgs};
use dbmcp_sdk::unity_catalog;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CreateCatalogArgs {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CatalogNameArgs {
    pub catalog_name: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CreateSchemaArgs {
    pub catalog_name: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ListTablesArgs {
    pub catalog_name: String,
    pub schema_name: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CreateTableArgs {
    /// Warehouse to execute the DDL on; falls back to DATABRICKS_WAREHOUSE_ID.
    #[serde(default)]
    pub warehouse_id: Option<String>,
    /// The CREATE TABLE statement.
    pub statement: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct TableLineageArgs {
    /// Fully qualified table name: catalog.schema.table.
    pub full_name: String,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "list_catalogs",
            "List catalogs in Unity Catalog",
            |ctx: Arc<AppContext>, _args: EmptyArgs| async move {
                forward("Error listing catalogs", unity_catalog::list_catalogs(&ctx.client).await)
            },
        )
        .tool(
            "create_catalog",
            "Create a catalog with parameters: name, comment",
            |ctx: Arc<AppContext>, args: CreateCatalogArgs| async move {
                forward(
                    "Error creating catalog",
                    unity_catalog::create_catalog(&ctx.client, &args.name, args.comment.as_deref())
                        .await,
                )
            },
        )
        .tool(
            "list_schemas",
            "List schemas for a catalog with parameter: catalog_name",
            |ctx: Arc<AppContext>, args: CatalogNameArgs| async move {
                forward(
                    "Error listing schemas",
                    unity_catalog::list_schemas(&ctx.client, &args.catalog_name).await,
                )
            },
        )
        .tool(
            "create_schema",
            "Create schema with parameters: catalog_name, name, comment",
            |ctx: Arc<AppContext>, args: CreateSchemaArgs| async move {
                forward(
                    "Error creating schema",
                    unity_catalog::create_schema(
                        &ctx.client,
                        &args.catalog_name,
                        &args.name,
                        args.comment.as_deref(),
                    )
                    .await,
                )
            },
        )
        .tool(
            "list_tables",
            "List tables with parameters: catalog_name, schema_name",
            |ctx: Arc<AppContext>, args: ListTablesArgs| async move {
                forward(
                    "Error listing tables",
                    unity_catalog::list_tables(&ctx.client, &args.catalog_name, &args.schema_name)
                        .await,
                )
            },
        )
        .tool(
            "create_table",
            "Create table via SQL with parameters: warehouse_id, statement",
            create_table_tool,
        )
        .tool(
            "get_table_lineage",
            "Get table lineage with parameter: full_name",
            |ctx: Arc<AppContext>, args: TableLineageArgs| async move {
                forward(
                    "Error getting lineage",
                    unity_catalog::get_table_lineage(&ctx.client, &args.full_name).await,
                )
            },
        )
}

async fn create_table_tool(ctx: Arc<AppContext>, args: CreateTableArgs) -> ToolResult {
    let warehouse_id = args
        .warehouse_id
        .as_deref()
        .or(ctx.settings.warehouse_id.as_deref())
        .unwrap_or_default()
        .to_string();
    forward(
        "Error creating table",
        unity_catalog::create_table(&ctx.client, &warehouse_id, &args.statement).await,
    )
}
