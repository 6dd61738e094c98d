//! Tool catalog assembly.

use dbmcp_sdk::{ApiClient, Settings};

use crate::core::McpServer;
use crate::tools;

/// Shared context handed to every tool handler.
///
/// The client and settings are immutable after startup, so concurrent tool
/// calls need no locking; each call owns its own timers and handles.
pub struct AppContext {
    pub client: ApiClient,
    pub settings: Settings,
}

impl AppContext {
    pub fn new(client: ApiClient, settings: Settings) -> Self {
        Self { client, settings }
    }
}

/// Build the MCP server with the full Databricks tool catalog registered.
pub fn build_server(ctx: AppContext) -> McpServer<AppContext> {
    let server = McpServer::new(ctx);
    let server = tools::clusters::register(server);
    let server = tools::jobs::register(server);
    let server = tools::notebooks::register(server);
    let server = tools::dbfs::register(server);
    let server = tools::repos::register(server);
    let server = tools::sql::register(server);
    let server = tools::libraries::register(server);
    let server = tools::unity_catalog::register(server);
    tools::genie::register(server)
}
