//! Workspace notebook and file tools.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::{forward, json_result};
use dbmcp_sdk::notebooks;

/// Exported notebook content beyond this length is summarized so a single
/// tool response cannot flood the model's context.
const EXPORT_PREVIEW_CHARS: usize = 1000;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ListNotebooksArgs {
    pub path: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ExportNotebookArgs {
    pub path: String,
    /// One of SOURCE, HTML, JUPYTER, DBC.
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ImportNotebookArgs {
    pub path: String,
    /// Notebook body, raw source or base64.
    pub content: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct DeleteWorkspaceObjectArgs {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct WorkspaceFileArgs {
    pub workspace_path: String,
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct WorkspaceFileInfoArgs {
    pub workspace_path: String,
}

fn default_format() -> String {
    "SOURCE".to_string()
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "list_notebooks",
            "List notebooks in a workspace directory with parameter: path (required)",
            |ctx: Arc<AppContext>, args: ListNotebooksArgs| async move {
                forward(
                    "Error listing notebooks",
                    notebooks::list_notebooks(&ctx.client, &args.path).await,
                )
            },
        )
        .tool(
            "export_notebook",
            "Export a notebook from the workspace with parameters: path (required), \
             format (optional, one of: SOURCE, HTML, JUPYTER, DBC)",
            export_notebook_tool,
        )
        .tool(
            "import_notebook",
            "Import a notebook; parameters: path, content (base64 or text), format (optional)",
            |ctx: Arc<AppContext>, args: ImportNotebookArgs| async move {
                forward(
                    "Error importing notebook",
                    notebooks::import_notebook(
                        &ctx.client,
                        &args.path,
                        &args.content,
                        &args.format,
                        args.language.as_deref(),
                        args.overwrite,
                    )
                    .await,
                )
            },
        )
        .tool(
            "delete_workspace_object",
            "Delete a notebook or directory with parameters: path, recursive (optional)",
            |ctx: Arc<AppContext>, args: DeleteWorkspaceObjectArgs| async move {
                forward(
                    "Error deleting workspace object",
                    notebooks::delete_notebook(&ctx.client, &args.path, args.recursive).await,
                )
            },
        )
        .tool(
            "get_workspace_file_content",
            "Retrieve the content of a file from the Databricks workspace with parameters: \
             workspace_path (required), format (optional: SOURCE, HTML, JUPYTER, DBC - default SOURCE)",
            |ctx: Arc<AppContext>, args: WorkspaceFileArgs| async move {
                forward(
                    "Error getting workspace file content",
                    notebooks::export_workspace_file(&ctx.client, &args.workspace_path, &args.format)
                        .await,
                )
            },
        )
        .tool(
            "get_workspace_file_info",
            "Get metadata about a workspace file with parameter: workspace_path (required)",
            |ctx: Arc<AppContext>, args: WorkspaceFileInfoArgs| async move {
                forward(
                    "Error getting workspace file info",
                    notebooks::get_workspace_file_info(&ctx.client, &args.workspace_path).await,
                )
            },
        )
}

async fn export_notebook_tool(ctx: Arc<AppContext>, args: ExportNotebookArgs) -> ToolResult {
    match notebooks::export_notebook(&ctx.client, &args.path, &args.format).await {
        Ok(mut response) => {
            truncate_field(&mut response, "content");
            truncate_field(&mut response, "decoded_content");
            json_result(&response)
        }
        Err(err) => ToolResult::error(format!("Error exporting notebook: {err}")),
    }
}

fn truncate_field(response: &mut Value, field: &str) {
    let Some(text) = response.get(field).and_then(Value::as_str) else {
        return;
    };
    if text.len() > EXPORT_PREVIEW_CHARS {
        let total = text.len();
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < EXPORT_PREVIEW_CHARS)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        response[field] = json!(format!(
            "{}... [content truncated, total length: {total} characters]",
            &text[..cut]
        ));
    }
}
