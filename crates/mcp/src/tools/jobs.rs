//! Job and run management tools.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::{forward, EmptyArgs};
use dbmcp_sdk::{jobs, repos};

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CreateJobArgs {
    pub name: String,
    /// Task definitions as accepted by the Jobs API.
    pub tasks: Value,
    #[serde(default)]
    pub existing_cluster_id: Option<String>,
    #[serde(default)]
    pub new_cluster: Option<Value>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct JobIdArgs {
    pub job_id: i64,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RunJobArgs {
    pub job_id: i64,
    #[serde(default)]
    pub notebook_params: Option<Value>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RunIdArgs {
    pub run_id: i64,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ListRunsArgs {
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default = "default_runs_limit")]
    pub limit: u32,
}

fn default_runs_limit() -> u32 {
    20
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RunNotebookArgs {
    pub notebook_path: String,
    #[serde(default)]
    pub existing_cluster_id: Option<String>,
    #[serde(default)]
    pub base_parameters: Option<Value>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct SyncRepoAndRunArgs {
    pub repo_id: i64,
    pub notebook_path: String,
    #[serde(default)]
    pub existing_cluster_id: Option<String>,
    #[serde(default)]
    pub base_parameters: Option<Value>,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "list_jobs",
            "List all Databricks jobs",
            |ctx: Arc<AppContext>, _args: EmptyArgs| async move {
                forward("Error listing jobs", jobs::list_jobs(&ctx.client).await)
            },
        )
        .tool(
            "create_job",
            "Create a Databricks job. Provide name and tasks list.",
            create_job_tool,
        )
        .tool(
            "delete_job",
            "Delete a Databricks job with parameter: job_id",
            |ctx: Arc<AppContext>, args: JobIdArgs| async move {
                forward("Error deleting job", jobs::delete_job(&ctx.client, args.job_id).await)
            },
        )
        .tool(
            "run_job",
            "Run a Databricks job with parameters: job_id (required), notebook_params (optional)",
            |ctx: Arc<AppContext>, args: RunJobArgs| async move {
                forward(
                    "Error running job",
                    jobs::run_job(&ctx.client, args.job_id, args.notebook_params.as_ref()).await,
                )
            },
        )
        .tool(
            "run_notebook",
            "Submit a one-time notebook run with parameters: notebook_path (required), \
             existing_cluster_id (optional), base_parameters (optional)",
            run_notebook_tool,
        )
        .tool(
            "sync_repo_and_run_notebook",
            "Pull a repo then run a notebook. Parameters: repo_id, notebook_path, \
             existing_cluster_id (optional), base_parameters (optional)",
            sync_repo_and_run_tool,
        )
        .tool(
            "get_run_status",
            "Get status for a job run with parameter: run_id",
            |ctx: Arc<AppContext>, args: RunIdArgs| async move {
                forward(
                    "Error getting run status",
                    jobs::get_run_status(&ctx.client, args.run_id).await,
                )
            },
        )
        .tool(
            "list_job_runs",
            "List recent runs for a job with parameter: job_id",
            |ctx: Arc<AppContext>, args: ListRunsArgs| async move {
                forward(
                    "Error listing job runs",
                    jobs::list_runs(&ctx.client, args.job_id, args.limit).await,
                )
            },
        )
        .tool(
            "cancel_run",
            "Cancel a job run with parameter: run_id",
            |ctx: Arc<AppContext>, args: RunIdArgs| async move {
                forward("Error cancelling run", jobs::cancel_run(&ctx.client, args.run_id).await)
            },
        )
}

async fn create_job_tool(ctx: Arc<AppContext>, args: CreateJobArgs) -> ToolResult {
    let mut config = json!({ "name": args.name, "tasks": args.tasks });
    if let Some(cluster_id) = &args.existing_cluster_id {
        config["existing_cluster_id"] = json!(cluster_id);
    }
    if let Some(new_cluster) = &args.new_cluster {
        config["new_cluster"] = new_cluster.clone();
    }
    forward("Error creating job", jobs::create_job(&ctx.client, &config).await)
}

async fn run_notebook_tool(ctx: Arc<AppContext>, args: RunNotebookArgs) -> ToolResult {
    forward(
        "Error running notebook",
        jobs::run_notebook(
            &ctx.client,
            &args.notebook_path,
            args.existing_cluster_id.as_deref(),
            args.base_parameters.as_ref(),
            jobs::DEFAULT_RUN_TIMEOUT,
            jobs::DEFAULT_RUN_POLL_INTERVAL,
        )
        .await,
    )
}

async fn sync_repo_and_run_tool(ctx: Arc<AppContext>, args: SyncRepoAndRunArgs) -> ToolResult {
    if let Err(err) = repos::pull_repo(&ctx.client, args.repo_id).await {
        return ToolResult::error(format!("Error pulling repo: {err}"));
    }
    forward(
        "Error running notebook",
        jobs::run_notebook(
            &ctx.client,
            &args.notebook_path,
            args.existing_cluster_id.as_deref(),
            args.base_parameters.as_ref(),
            jobs::DEFAULT_RUN_TIMEOUT,
            jobs::DEFAULT_RUN_POLL_INTERVAL,
        )
        .await,
    )
}
