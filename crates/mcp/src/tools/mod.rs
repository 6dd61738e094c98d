//! MCP tool catalog, one module per Databricks service.

pub mod clusters;
pub mod dbfs;
pub mod genie;
pub mod jobs;
pub mod libraries;
pub mod notebooks;
pub mod repos;
pub mod sql;
pub mod unity_catalog;

use serde::Deserialize;
use serde_json::Value;

use crate::core::ToolResult;
use dbmcp_sdk::error::ApiError;

/// Argument struct for tools that take no input.
#[derive(Deserialize, schemars::JsonSchema)]
pub struct EmptyArgs {}

/// Render an API payload as a pretty-printed text block.
pub(crate) fn json_result(value: &Value) -> ToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(json) => ToolResult::success(json),
        Err(err) => ToolResult::error(format!("Failed to serialize response: {err}")),
    }
}

/// Collapse an SDK call into a tool result.
pub(crate) fn forward(context: &str, result: Result<Value, ApiError>) -> ToolResult {
    match result {
        Ok(value) => json_result(&value),
        Err(err) => ToolResult::error(format!("{context}: {err}")),
    }
}
