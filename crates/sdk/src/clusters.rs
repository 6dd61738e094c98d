//! Cluster lifecycle operations.

use serde_json::{json, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;

/// List all clusters in the workspace.
pub async fn list_clusters(client: &ApiClient) -> Result<Value> {
    info!("Listing clusters");
    client.get("/api/2.0/clusters/list", &[]).await
}

/// Create a cluster from a raw configuration payload.
///
/// The payload is forwarded untouched; the service validates it. Expected
/// fields include `cluster_name`, `spark_version` and `node_type_id`.
pub async fn create_cluster(client: &ApiClient, config: &Value) -> Result<Value> {
    info!("Creating new cluster");
    client.post("/api/2.0/clusters/create", config).await
}

/// Terminate a running cluster.
pub async fn terminate_cluster(client: &ApiClient, cluster_id: &str) -> Result<Value> {
    info!(cluster_id, "Terminating cluster");
    client
        .post("/api/2.0/clusters/delete", &json!({ "cluster_id": cluster_id }))
        .await
}

/// Get information about a specific cluster.
pub async fn get_cluster(client: &ApiClient, cluster_id: &str) -> Result<Value> {
    info!(cluster_id, "Getting cluster info");
    client
        .get(
            "/api/2.0/clusters/get",
            &[("cluster_id", cluster_id.to_string())],
        )
        .await
}

/// Start a terminated cluster.
pub async fn start_cluster(client: &ApiClient, cluster_id: &str) -> Result<Value> {
    info!(cluster_id, "Starting cluster");
    client
        .post("/api/2.0/clusters/start", &json!({ "cluster_id": cluster_id }))
        .await
}
