//! Genie natural-language query tools.
//!
//! The waiting tools block inside the server until the turn reaches a
//! terminal status or the poll deadline passes; remote failures and
//! timeouts come back as ordinary payloads the calling model can branch on.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{McpServer, ToolResult};
use crate::server::AppContext;
use crate::tools::{forward, json_result, EmptyArgs};
use dbmcp_sdk::genie::{self, PollSettings, TurnOutcome};

#[derive(Deserialize, schemars::JsonSchema)]
pub struct StartConversationArgs {
    /// Genie space to ask in.
    pub space_id: String,
    /// Natural language question.
    pub question: String,
    /// Poll until the answer is ready; when false, return immediately with
    /// ids for later status checks.
    #[serde(default = "default_true")]
    pub wait_for_result: bool,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: f64,
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: f64,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct FollowupArgs {
    pub space_id: String,
    /// Conversation ID returned by start_genie_conversation.
    pub conversation_id: String,
    pub question: String,
    #[serde(default = "default_true")]
    pub wait_for_result: bool,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: f64,
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: f64,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct MessageStatusArgs {
    pub space_id: String,
    pub conversation_id: String,
    pub message_id: String,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub struct QueryResultsArgs {
    pub space_id: String,
    pub conversation_id: String,
    pub message_id: String,
    pub attachment_id: String,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_seconds() -> f64 {
    genie::DEFAULT_POLL_INTERVAL.as_secs_f64()
}

fn default_max_wait_seconds() -> f64 {
    genie::DEFAULT_MAX_WAIT.as_secs_f64()
}

pub fn register(server: McpServer<AppContext>) -> McpServer<AppContext> {
    server
        .tool(
            "list_genie_spaces",
            "List all available Genie AI spaces in the workspace",
            |ctx: Arc<AppContext>, _args: EmptyArgs| async move {
                forward("Error listing Genie spaces", genie::list_spaces(&ctx.client).await)
            },
        )
        .tool(
            "start_genie_conversation",
            "Start a new conversation with Genie AI. Parameters: space_id (required), \
             question (required), wait_for_result (optional, default: true)",
            start_conversation_tool,
        )
        .tool(
            "send_genie_followup",
            "Send a follow-up message in an existing Genie conversation. Parameters: \
             space_id (required), conversation_id (required), question (required), \
             wait_for_result (optional, default: true)",
            followup_tool,
        )
        .tool(
            "get_genie_message_status",
            "Get the status of a Genie message. Parameters: space_id (required), \
             conversation_id (required), message_id (required)",
            message_status_tool,
        )
        .tool(
            "get_genie_query_results",
            "Get query results from a completed Genie message. Parameters: space_id \
             (required), conversation_id (required), message_id (required), \
             attachment_id (required)",
            query_results_tool,
        )
}

fn poll_settings(interval_seconds: f64, max_wait_seconds: f64) -> Result<PollSettings, String> {
    let poll_interval = Duration::try_from_secs_f64(interval_seconds)
        .map_err(|_| format!("invalid poll_interval_seconds: {interval_seconds}"))?;
    let max_wait = Duration::try_from_secs_f64(max_wait_seconds)
        .map_err(|_| format!("invalid max_wait_seconds: {max_wait_seconds}"))?;
    Ok(PollSettings {
        poll_interval,
        max_wait,
    })
}

fn outcome_result(outcome: TurnOutcome) -> ToolResult {
    match serde_json::to_value(&outcome) {
        Ok(value) => json_result(&value),
        Err(err) => ToolResult::error(format!("Failed to serialize outcome: {err}")),
    }
}

async fn start_conversation_tool(ctx: Arc<AppContext>, args: StartConversationArgs) -> ToolResult {
    let poll = match poll_settings(args.poll_interval_seconds, args.max_wait_seconds) {
        Ok(poll) => poll,
        Err(err) => return ToolResult::error(err),
    };
    match genie::start_conversation(
        &ctx.client,
        &args.space_id,
        &args.question,
        args.wait_for_result,
        poll,
    )
    .await
    {
        Ok(outcome) => outcome_result(outcome),
        Err(err) => ToolResult::error(format!("Error starting Genie conversation: {err}")),
    }
}

async fn followup_tool(ctx: Arc<AppContext>, args: FollowupArgs) -> ToolResult {
    let poll = match poll_settings(args.poll_interval_seconds, args.max_wait_seconds) {
        Ok(poll) => poll,
        Err(err) => return ToolResult::error(err),
    };
    match genie::send_followup(
        &ctx.client,
        &args.space_id,
        &args.conversation_id,
        &args.question,
        args.wait_for_result,
        poll,
    )
    .await
    {
        Ok(outcome) => outcome_result(outcome),
        Err(err) => ToolResult::error(format!("Error sending Genie follow-up: {err}")),
    }
}

async fn message_status_tool(ctx: Arc<AppContext>, args: MessageStatusArgs) -> ToolResult {
    match genie::get_message_status(
        &ctx.client,
        &args.space_id,
        &args.conversation_id,
        &args.message_id,
    )
    .await
    {
        Ok(message) => match serde_json::to_value(&message) {
            Ok(value) => json_result(&value),
            Err(err) => ToolResult::error(format!("Failed to serialize status: {err}")),
        },
        Err(err) => ToolResult::error(format!("Error getting Genie message status: {err}")),
    }
}

async fn query_results_tool(ctx: Arc<AppContext>, args: QueryResultsArgs) -> ToolResult {
    // Re-fetch the message so the result gate runs against the remote's
    // current state rather than whatever the caller last saw.
    let mut message = match genie::get_message_status(
        &ctx.client,
        &args.space_id,
        &args.conversation_id,
        &args.message_id,
    )
    .await
    {
        Ok(message) => message,
        Err(err) => {
            return ToolResult::error(format!("Error getting Genie message status: {err}"));
        }
    };
    message.attachment_id = Some(args.attachment_id);

    match genie::get_query_results(&ctx.client, &args.space_id, &args.conversation_id, &message)
        .await
    {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => json_result(&value),
            Err(err) => ToolResult::error(format!("Failed to serialize results: {err}")),
        },
        Err(err) => ToolResult::error(format!("Error getting Genie query results: {err}")),
    }
}
