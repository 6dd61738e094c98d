//! Workspace notebook and file operations.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

/// Import a notebook into the workspace.
///
/// `content` may be raw source or already base64-encoded; raw source is
/// encoded before upload.
pub async fn import_notebook(
    client: &ApiClient,
    path: &str,
    content: &str,
    format: &str,
    language: Option<&str>,
    overwrite: bool,
) -> Result<Value> {
    info!(path, "Importing notebook");

    let encoded = if is_base64(content) {
        content.to_string()
    } else {
        BASE64.encode(content.as_bytes())
    };

    let mut payload = json!({
        "path": path,
        "format": format,
        "content": encoded,
        "overwrite": overwrite,
    });
    if let Some(language) = language {
        payload["language"] = json!(language);
    }

    client.post("/api/2.0/workspace/import", &payload).await
}

/// Export a notebook, decoding the content for text formats.
pub async fn export_notebook(client: &ApiClient, path: &str, format: &str) -> Result<Value> {
    info!(path, format, "Exporting notebook");
    let mut response = client
        .get(
            "/api/2.0/workspace/export",
            &[("path", path.to_string()), ("format", format.to_string())],
        )
        .await?;

    if matches!(format, "SOURCE" | "JUPYTER") {
        if let Some(decoded) = decode_content(&response) {
            response["decoded_content"] = json!(decoded);
        }
    }
    Ok(response)
}

/// List notebooks and directories under a workspace path.
pub async fn list_notebooks(client: &ApiClient, path: &str) -> Result<Value> {
    info!(path, "Listing notebooks");
    client
        .get("/api/2.0/workspace/list", &[("path", path.to_string())])
        .await
}

/// Delete a notebook or directory.
pub async fn delete_notebook(client: &ApiClient, path: &str, recursive: bool) -> Result<Value> {
    info!(path, recursive, "Deleting workspace path");
    client
        .post(
            "/api/2.0/workspace/delete",
            &json!({ "path": path, "recursive": recursive }),
        )
        .await
}

/// Create a workspace directory.
pub async fn create_directory(client: &ApiClient, path: &str) -> Result<Value> {
    info!(path, "Creating directory");
    client
        .post("/api/2.0/workspace/mkdirs", &json!({ "path": path }))
        .await
}

/// Export any workspace file, annotating the response with a decoded body
/// and a sniffed content type for SOURCE exports.
pub async fn export_workspace_file(client: &ApiClient, path: &str, format: &str) -> Result<Value> {
    info!(path, "Exporting workspace file");
    let mut response = client
        .get(
            "/api/2.0/workspace/export",
            &[("path", path.to_string()), ("format", format.to_string())],
        )
        .await?;

    if format == "SOURCE" {
        match decode_content(&response) {
            Some(decoded) => {
                let content_type = if serde_json::from_str::<Value>(&decoded).is_ok() {
                    "json"
                } else {
                    "text"
                };
                response["decoded_content"] = json!(decoded);
                response["content_type"] = json!(content_type);
            }
            None => {
                if response.get("content").is_some() {
                    warn!(path, "Workspace file content could not be decoded as UTF-8 text");
                    response["content_type"] = json!("binary");
                    response["note"] = json!("Content could not be decoded as text");
                }
            }
        }
    }
    Ok(response)
}

/// Metadata for a single workspace file, found by listing its directory.
///
/// The workspace API has no direct stat endpoint; the parent listing is
/// filtered for the exact path instead.
pub async fn get_workspace_file_info(client: &ApiClient, path: &str) -> Result<Value> {
    info!(path, "Getting workspace file info");

    let directory = match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    };

    let listing = client
        .get("/api/2.0/workspace/list", &[("path", directory)])
        .await?;

    if let Some(objects) = listing.get("objects").and_then(Value::as_array) {
        for object in objects {
            if object.get("path").and_then(Value::as_str) == Some(path) {
                return Ok(object.clone());
            }
        }
    }

    Err(ApiError::InvalidInput(format!("File not found: {path}")))
}

/// Whether a string round-trips through base64, meaning it is already
/// encoded.
fn is_base64(content: &str) -> bool {
    BASE64
        .decode(content)
        .map(|decoded| BASE64.encode(decoded) == content)
        .unwrap_or(false)
}

fn decode_content(response: &Value) -> Option<String> {
    let content = response.get("content")?.as_str()?;
    let bytes = BASE64.decode(content).ok()?;
    String::from_utf8(bytes).ok()
}
