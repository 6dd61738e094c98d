//! Minimal MCP server core: JSON-RPC 2.0 framing over line-delimited stdio.
//!
//! The server exposes tools only; it publishes no resources or prompts.
//! Handlers are registered with typed argument structs whose JSON schema is
//! derived via `schemars` and advertised through `tools/list`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

const SERVER_NAME: &str = "databricks-mcp";
const SERVER_INSTRUCTIONS: &str = "Use this server to manage Databricks resources: clusters, \
jobs, notebooks, DBFS, SQL warehouses, Unity Catalog, repos and Genie natural-language queries.";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcNotification {
    jsonrpc: String,
    method: String,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    result: Value,
}

impl JsonRpcResponse {
    fn new(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    jsonrpc: &'static str,
    id: Value,
    error: ErrorObject,
}

#[derive(Debug, Serialize)]
struct ErrorObject {
    code: i32,
    message: String,
}

impl JsonRpcError {
    fn new(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error: ErrorObject {
                code,
                message: message.into(),
            },
        }
    }

    fn parse_error() -> Self {
        Self::new(Value::Null, PARSE_ERROR, "Parse error")
    }

    fn method_not_found(id: Value, method: &str) -> Self {
        Self::new(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    fn invalid_params(id: Value, message: impl Into<String>) -> Self {
        Self::new(id, INVALID_PARAMS, message)
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::new())
    }
}

/// Tool metadata advertised through `tools/list`.
#[derive(Debug, Serialize, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result payload of a single tool invocation.
///
/// Tool-level failures (bad arguments, SDK errors) are reported through
/// `isError` so the client model can read them; JSON-RPC errors are reserved
/// for protocol violations.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(text: String) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    pub fn error(text: String) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: String) -> Self {
        Self {
            content_type: "text".to_string(),
            text,
        }
    }
}

pub type ToolHandler<C> =
    Arc<dyn Fn(Arc<C>, Value) -> BoxFuture<'static, ToolResult> + Send + Sync>;

struct ToolDef<C> {
    description: String,
    input_schema: Value,
    handler: ToolHandler<C>,
}

/// MCP server over a shared application context `C`.
pub struct McpServer<C> {
    ctx: Arc<C>,
    tools: HashMap<String, ToolDef<C>>,
}

impl<C: Send + Sync + 'static> McpServer<C> {
    pub fn new(ctx: C) -> Self {
        Self {
            ctx: Arc::new(ctx),
            tools: HashMap::new(),
        }
    }

    /// Register a tool with a typed argument struct.
    ///
    /// The argument schema is derived from `A`; malformed arguments are
    /// reported back to the client as an error tool result.
    pub fn tool<A, F, Fut>(mut self, name: &str, description: &str, handler: F) -> Self
    where
        A: DeserializeOwned + schemars::JsonSchema + Send + 'static,
        F: Fn(Arc<C>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let schema = schema_for!(A);
        let input_schema = serde_json::to_value(&schema).unwrap_or_else(|_| json!({}));

        let handler = Arc::new(handler);
        let handler =
            Arc::new(move |ctx: Arc<C>, arguments: Value| -> BoxFuture<'static, ToolResult> {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    match serde_json::from_value::<A>(arguments) {
                        Ok(args) => handler(ctx, args).await,
                        Err(err) => ToolResult::error(format!("Invalid tool arguments: {err}")),
                    }
                })
            });

        self.tools.insert(
            name.to_string(),
            ToolDef {
                description: description.to_string(),
                input_schema,
                handler,
            },
        );
        self
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self
            .tools
            .iter()
            .map(|(name, def)| Tool {
                name: name.clone(),
                description: def.description.clone(),
                input_schema: def.input_schema.clone(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        Ok((tool.handler)(Arc::clone(&self.ctx), arguments).await)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": SERVER_INSTRUCTIONS,
        })
    }

    /// Serve requests from stdin until EOF, writing responses to stdout.
    ///
    /// On EOF or a read error the shutdown channel is signalled so background
    /// tasks can stop. Logging must go to stderr; stdout carries the wire.
    pub async fn run_stdio(self, shutdown_tx: broadcast::Sender<()>) -> Result<(), String> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    let _ = shutdown_tx.send(());
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some(response) = self.handle_message(trimmed).await {
                        write_line(&mut stdout, &response).await?;
                    }
                }
                Err(err) => {
                    let _ = shutdown_tx.send(());
                    return Err(format!("Error reading from stdin: {err}"));
                }
            }
        }

        Ok(())
    }

    /// Dispatch one JSON-RPC message; `None` means nothing is written back.
    pub async fn handle_message(&self, msg: &str) -> Option<String> {
        if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(msg) {
            if notification.jsonrpc == JSONRPC_VERSION
                && notification.method == "notifications/initialized"
            {
                return None;
            }
        }

        let request: JsonRpcRequest = match serde_json::from_str(msg) {
            Ok(req) => req,
            Err(_) => return Some(JsonRpcError::parse_error().to_json()),
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcError::parse_error().to_json());
        }

        let id = request.id.unwrap_or(Value::Null);
        let params = request.params.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::new(id, self.initialize_result()).to_json(),
            "tools/list" => {
                JsonRpcResponse::new(id, json!({ "tools": self.list_tools() })).to_json()
            }
            "tools/call" => self.handle_tools_call(id, params).await,
            "ping" => JsonRpcResponse::new(id, json!({})).to_json(),
            method => JsonRpcError::method_not_found(id, method).to_json(),
        };

        Some(response)
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> String {
        let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcError::invalid_params(id, "Missing 'name' parameter").to_json();
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        tracing::debug!(tool = tool_name, "Dispatching tool call");
        match self.call_tool(tool_name, arguments).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::new(id, value).to_json(),
                Err(err) => JsonRpcError::invalid_params(
                    id,
                    format!("Failed to serialize tool result: {err}"),
                )
                .to_json(),
            },
            Err(err) => JsonRpcError::invalid_params(id, err).to_json(),
        }
    }
}

async fn write_line(stdout: &mut tokio::io::Stdout, response: &str) -> Result<(), String> {
    stdout
        .write_all(response.as_bytes())
        .await
        .map_err(|err| format!("Failed to write response: {err}"))?;
    stdout
        .write_all(b"\n")
        .await
        .map_err(|err| format!("Failed to write newline: {err}"))?;
    stdout
        .flush()
        .await
        .map_err(|err| format!("Failed to flush stdout: {err}"))?;
    Ok(())
}
