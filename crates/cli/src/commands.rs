//! Command implementations.

use clap::Args;
use tokio::sync::broadcast;

use dbmcp_mcp::{build_server, AppContext};
use dbmcp_sdk::{jobs, repos, ApiClient, Settings};

#[derive(Args)]
pub struct StartArgs {
    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args)]
pub struct SyncRunArgs {
    /// Repo ID to pull before running.
    #[arg(long)]
    pub repo_id: i64,
    /// Workspace path of the notebook to run.
    #[arg(long)]
    pub notebook_path: String,
    /// Existing cluster to run on.
    #[arg(long)]
    pub cluster_id: Option<String>,
}

fn connect() -> Result<(ApiClient, Settings), String> {
    let settings = Settings::from_env().map_err(|err| err.to_string())?;
    let client = ApiClient::from_settings(&settings).map_err(|err| err.to_string())?;
    Ok((client, settings))
}

/// Run the MCP server over stdio until the client disconnects.
pub async fn start() -> Result<(), String> {
    let (client, settings) = connect()?;
    tracing::info!(host = %settings.host, "Starting Databricks MCP server");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let server = build_server(AppContext::new(client, settings));
    server
        .run_stdio(shutdown_tx)
        .await
        .map_err(|err| format!("MCP server error: {err}"))
}

/// Print the registered tool catalog.
pub async fn list_tools() -> Result<(), String> {
    let (client, settings) = connect()?;
    let server = build_server(AppContext::new(client, settings));

    println!("\nAvailable tools:");
    for tool in server.list_tools() {
        println!("  - {}: {}", tool.name, tool.description);
    }
    Ok(())
}

pub fn version() {
    println!("Databricks MCP Server v{}", env!("CARGO_PKG_VERSION"));
}

/// Pull a repo, run a notebook on the fresh checkout, and print its output.
pub async fn sync_run(args: SyncRunArgs) -> Result<(), String> {
    let (client, _settings) = connect()?;

    repos::pull_repo(&client, args.repo_id)
        .await
        .map_err(|err| format!("Failed to pull repo {}: {err}", args.repo_id))?;

    let output = jobs::run_notebook(
        &client,
        &args.notebook_path,
        args.cluster_id.as_deref(),
        None,
        jobs::DEFAULT_RUN_TIMEOUT,
        jobs::DEFAULT_RUN_POLL_INTERVAL,
    )
    .await
    .map_err(|err| format!("Notebook run failed: {err}"))?;

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|err| format!("Failed to render run output: {err}"))?;
    println!("{rendered}");
    Ok(())
}
