//! Command-line surface for the Databricks MCP server.

pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};

use crate::commands::{StartArgs, SyncRunArgs};

#[derive(Parser)]
#[command(name = "databricks-mcp", about = "Databricks MCP Server CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server on stdio.
    Start(StartArgs),
    /// List available tools.
    ListTools,
    /// Show server version.
    Version,
    /// Pull a repo and run a notebook.
    SyncRun(SyncRunArgs),
}

async fn run_cli_async<F, Fut>(f: F) -> i32
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    match f().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Parse arguments and dispatch; returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    match cli.command {
        Command::Start(args) => {
            logging::init_tracing(args.debug);
            run_cli_async(commands::start).await
        }
        Command::ListTools => {
            logging::init_tracing(false);
            run_cli_async(commands::list_tools).await
        }
        Command::Version => {
            commands::version();
            0
        }
        Command::SyncRun(args) => {
            logging::init_tracing(false);
            run_cli_async(|| commands::sync_run(args)).await
        }
    }
}
