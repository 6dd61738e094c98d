//! DBFS tools.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::forward;
use dbmcp_sdk::dbfs;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct DbfsPathArgs {
    pub dbfs_path: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct DbfsPutArgs {
    pub dbfs_path: String,
    /// File contents, base64-encoded.
    pub content_base64: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct DbfsDeleteArgs {
    pub dbfs_path: String,
    #[serde(default)]
    pub recursive: bool,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "list_files",
            "List files and directories in a DBFS path with parameter: dbfs_path (required)",
            |ctx: Arc<AppContext>, args: DbfsPathArgs| async move {
                forward("Error listing files", dbfs::list_files(&ctx.client, &args.dbfs_path).await)
            },
        )
        .tool(
            "dbfs_put",
            "Upload a small file to DBFS with parameters: dbfs_path, content_base64",
            dbfs_put_tool,
        )
        .tool(
            "dbfs_delete",
            "Delete a file or directory in DBFS with parameters: dbfs_path, recursive (optional)",
            |ctx: Arc<AppContext>, args: DbfsDeleteArgs| async move {
                forward(
                    "Error deleting file",
                    dbfs::delete_file(&ctx.client, &args.dbfs_path, args.recursive).await,
                )
            },
        )
}

async fn dbfs_put_tool(ctx: Arc<AppContext>, args: DbfsPutArgs) -> ToolResult {
    let data = match BASE64.decode(&args.content_base64) {
        Ok(data) => data,
        Err(err) => return ToolResult::error(format!("content_base64 is not valid base64: {err}")),
    };
    forward(
        "Error uploading file",
        dbfs::put_file(&ctx.client, &args.dbfs_path, &data).await,
    )
}
