//! Databricks Repos operations.

use serde_json::{json, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;

/// Create (clone) a repo in the workspace.
pub async fn create_repo(
    client: &ApiClient,
    url: &str,
    provider: &str,
    branch: Option<&str>,
    path: Option<&str>,
) -> Result<Value> {
    info!(url, provider, "Creating repo");
    let mut payload = json!({ "url": url, "provider": provider });
    if let Some(branch) = branch {
        payload["branch"] = json!(branch);
    }
    if let Some(path) = path {
        payload["path"] = json!(path);
    }
    client.post("/api/2.0/repos", &payload).await
}

/// Check out a branch or tag in an existing repo.
pub async fn update_repo(
    client: &ApiClient,
    repo_id: i64,
    branch: Option<&str>,
    tag: Option<&str>,
) -> Result<Value> {
    info!(repo_id, "Updating repo");
    let mut payload = json!({});
    if let Some(branch) = branch {
        payload["branch"] = json!(branch);
    }
    if let Some(tag) = tag {
        payload["tag"] = json!(tag);
    }
    client
        .patch(&format!("/api/2.0/repos/{repo_id}"), &payload)
        .await
}

/// List repos, optionally filtered by a path prefix.
pub async fn list_repos(client: &ApiClient, path_prefix: Option<&str>) -> Result<Value> {
    info!("Listing repos");
    let query = match path_prefix {
        Some(prefix) => vec![("path_prefix", prefix.to_string())],
        None => Vec::new(),
    };
    client.get("/api/2.0/repos", &query).await
}

/// Pull the latest commit for a repo.
pub async fn pull_repo(client: &ApiClient, repo_id: i64) -> Result<Value> {
    info!(repo_id, "Pulling repo");
    client
        .post(&format!("/api/2.0/repos/{repo_id}/pull"), &json!({}))
        .await
}
