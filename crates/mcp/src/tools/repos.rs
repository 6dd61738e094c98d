//! Repos tools.

use std::sync::Arc;

use serde::Deserialize;

use crate::core::McpServer;
use crate::server::AppContext;
use crate::tools::forward;
use dbmcp_sdk::repos;

#[derive(Deserialize, schemars::JsonSchema)]
pub struct CreateRepoArgs {
    pub url: String,
    /// Git provider, e.g. "gitHub" or "gitLab".
    pub provider: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct UpdateRepoArgs {
    pub repo_id: i64,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct ListReposArgs {
    #[serde(default)]
    pub path_prefix: Option<String>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct RepoIdArgs {
    pub repo_id: i64,
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "create_repo",
            "Create or clone a repo with parameters: url, provider, branch (optional)",
            |ctx: Arc<AppContext>, args: CreateRepoArgs| async move {
                forward(
                    "Error creating repo",
                    repos::create_repo(
                        &ctx.client,
                        &args.url,
                        &args.provider,
                        args.branch.as_deref(),
                        args.path.as_deref(),
                    )
                    .await,
                )
            },
        )
        .tool(
            "update_repo",
            "Update repo branch with parameters: repo_id, branch or tag",
            |ctx: Arc<AppContext>, args: UpdateRepoArgs| async move {
                forward(
                    "Error updating repo",
                    repos::update_repo(
                        &ctx.client,
                        args.repo_id,
                        args.branch.as_deref(),
                        args.tag.as_deref(),
                    )
                    .await,
                )
            },
        )
        .tool(
            "list_repos",
            "List repos with optional path_prefix",
            |ctx: Arc<AppContext>, args: ListReposArgs| async move {
                forward(
                    "Error listing repos",
                    repos::list_repos(&ctx.client, args.path_prefix.as_deref()).await,
                )
            },
        )
        .tool(
            "pull_repo",
            "Pull the latest commit for a repo with parameter: repo_id (required)",
            |ctx: Arc<AppContext>, args: RepoIdArgs| async move {
                forward("Error pulling repo", repos::pull_repo(&ctx.client, args.repo_id).await)
            },
        )
}
