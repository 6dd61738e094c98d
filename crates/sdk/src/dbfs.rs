//! DBFS file operations.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;

/// List files and directories under a DBFS path.
pub async fn list_files(client: &ApiClient, dbfs_path: &str) -> Result<Value> {
    info!(dbfs_path, "Listing DBFS path");
    client
        .get("/api/2.0/dbfs/list", &[("path", dbfs_path.to_string())])
        .await
}

/// Upload a small file to DBFS in a single request.
///
/// Suitable for payloads under the 1 MB single-request limit; larger uploads
/// need the streaming create/add-block API, which this server does not expose.
pub async fn put_file(client: &ApiClient, dbfs_path: &str, data: &[u8]) -> Result<Value> {
    info!(dbfs_path, bytes = data.len(), "Uploading file to DBFS");
    client
        .post(
            "/api/2.0/dbfs/put",
            &json!({
                "path": dbfs_path,
                "contents": BASE64.encode(data),
                "overwrite": true
            }),
        )
        .await
}

/// Delete a DBFS file or directory.
pub async fn delete_file(client: &ApiClient, dbfs_path: &str, recursive: bool) -> Result<Value> {
    info!(dbfs_path, recursive, "Deleting DBFS path");
    client
        .post(
            "/api/2.0/dbfs/delete",
            &json!({ "path": dbfs_path, "recursive": recursive }),
        )
        .await
}
