//! Tracing setup.
//!
//! All diagnostics go to stderr: stdout belongs to the MCP wire and a stray
//! log line there corrupts the JSON-RPC stream.

use tracing_subscriber::EnvFilter;

pub fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
