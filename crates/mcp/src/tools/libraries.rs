//! Cluster library tools.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::core::McpServer;
use crate::server::AppContext;
use crate::tools::forward;
use dbmcp_sdk::libraries;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct LibraryListArgs {
    pub cluster_id: String,
    /// Library specs as accepted by the Libraries API (pypi, maven, whl, ...).
    #[serde(default)]
    pub libraries: Vec<Value>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ClusterLibrariesArgs {
    pub cluster_id: String,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "install_library",
            "Install a library on a cluster with parameters: cluster_id, libraries",
            |ctx: Arc<AppContext>, args: LibraryListArgs| async move {
                forward(
                    "Error installing library",
                    libraries::install_library(&ctx.client, &args.cluster_id, &args.libraries).await,
                )
            },
        )
        .tool(
            "uninstall_library",
            "Uninstall a library from a cluster with parameters: cluster_id, libraries",
            |ctx: Arc<AppContext>, args: LibraryListArgs| async move {
                forward(
                    "Error uninstalling library",
                    libraries::uninstall_library(&ctx.client, &args.cluster_id, &args.libraries)
                        .await,
                )
            },
        )
        .tool(
            "list_cluster_libraries",
            "List library status for a cluster with parameter: cluster_id",
            |ctx: Arc<AppContext>, args: ClusterLibrariesArgs| async move {
                forward(
                    "Error listing cluster libraries",
                    libraries::list_cluster_libraries(&ctx.client, &args.cluster_id).await,
                )
            },
        )
}
