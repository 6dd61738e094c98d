//! MCP server exposing Databricks REST operations as assistant tools.
//!
//! [`core`] is the transport- and domain-agnostic JSON-RPC/stdio machinery;
//! [`server`] assembles the Databricks tool catalog on top of it.

pub mod core;
pub mod server;
pub mod tools;

pub use crate::core::{McpServer, Tool, ToolResult};
pub use crate::server::{build_server, AppContext};
