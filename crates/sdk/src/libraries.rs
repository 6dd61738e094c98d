//! Cluster library management.

use serde_json::{json, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::Result;

/// Install libraries on a cluster.
///
/// Each entry is a library spec as the service defines it (`pypi`, `maven`,
/// `whl`, ...); the list is forwarded untouched.
pub async fn install_library(
    client: &ApiClient,
    cluster_id: &str,
    libraries: &[Value],
) -> Result<Value> {
    info!(cluster_id, count = libraries.len(), "Installing libraries");
    client
        .post(
            "/api/2.0/libraries/install",
            &json!({ "cluster_id": cluster_id, "libraries": libraries }),
        )
        .await
}

/// Uninstall libraries from a cluster.
pub async fn uninstall_library(
    client: &ApiClient,
    cluster_id: &str,
    libraries: &[Value],
) -> Result<Value> {
    info!(cluster_id, count = libraries.len(), "Uninstalling libraries");
    client
        .post(
            "/api/2.0/libraries/uninstall",
            &json!({ "cluster_id": cluster_id, "libraries": libraries }),
        )
        .await
}

/// Library status for every library on a cluster.
pub async fn list_cluster_libraries(client: &ApiClient, cluster_id: &str) -> Result<Value> {
    info!(cluster_id, "Listing cluster libraries");
    client
        .get(
            "/api/2.0/libraries/cluster-status",
            &[("cluster_id", cluster_id.to_string())],
        )
        .await
}
