//! Cluster management tools.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::{forward, EmptyArgs};
use dbmcp_sdk::clusters;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CreateClusterArgs {
    pub cluster_name: String,
    /// Spark runtime version, e.g. "14.3.x-scala2.12".
    pub spark_version: String,
    pub node_type_id: String,
    #[serde(default)]
    pub num_workers: Option<i64>,
    #[serde(default)]
    pub autotermination_minutes: Option<i64>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ClusterIdArgs {
    pub cluster_id: String,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "list_clusters",
            "List all Databricks clusters",
            |ctx: Arc<AppContext>, _args: EmptyArgs| async move {
                forward("Error listing clusters", clusters::list_clusters(&ctx.client).await)
            },
        )
        .tool(
            "create_cluster",
            "Create a new Databricks cluster with parameters: cluster_name (required), \
             spark_version (required), node_type_id (required), num_workers, \
             autotermination_minutes",
            create_cluster_tool,
        )
        .tool(
            "terminate_cluster",
            "Terminate a Databricks cluster with parameter: cluster_id (required)",
            |ctx: Arc<AppContext>, args: ClusterIdArgs| async move {
                forward(
                    "Error terminating cluster",
                    clusters::terminate_cluster(&ctx.client, &args.cluster_id).await,
                )
            },
        )
        .tool(
            "get_cluster",
            "Get information about a specific Databricks cluster with parameter: cluster_id (required)",
            |ctx: Arc<AppContext>, args: ClusterIdArgs| async move {
                forward(
                    "Error getting cluster info",
                    clusters::get_cluster(&ctx.client, &args.cluster_id).await,
                )
            },
        )
        .tool(
            "start_cluster",
            "Start a terminated Databricks cluster with parameter: cluster_id (required)",
            |ctx: Arc<AppContext>, args: ClusterIdArgs| async move {
                forward(
                    "Error starting cluster",
                    clusters::start_cluster(&ctx.client, &args.cluster_id).await,
                )
            },
        )
}

async fn create_cluster_tool(ctx: Arc<AppContext>, args: CreateClusterArgs) -> ToolResult {
    let mut config = json!({
        "cluster_name": args.cluster_name,
        "spark_version": args.spark_version,
        "node_type_id": args.node_type_id,
    });
    if let Some(num_workers) = args.num_workers {
        config["num_workers"] = json!(num_workers);
    }
    if let Some(minutes) = args.autotermination_minutes {
        config["autotermination_minutes"] = json!(minutes);
    }

    forward(
        "Error creating cluster",
        clusters::create_cluster(&ctx.client, &config).await,
    )
}
