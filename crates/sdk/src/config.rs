//! Workspace connection settings.
//!
//! Settings come from the process environment, optionally backfilled by a
//! `.env` file in the current directory. Environment variables always win,
//! matching how MCP clients (Cursor, Claude Desktop) inject credentials.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::dotenv::read_dotenv;

const ENV_HOST: &str = "DATABRICKS_HOST";
const ENV_TOKEN: &str = "DATABRICKS_TOKEN";
const ENV_WAREHOUSE_ID: &str = "DATABRICKS_WAREHOUSE_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid {ENV_HOST} '{value}': {reason}")]
    InvalidHost { value: String, reason: String },

    #[error("{0}")]
    Dotenv(String),
}

/// Resolved connection settings for a Databricks workspace.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Workspace base URL, without a trailing slash.
    pub host: String,
    /// Personal access token attached as a bearer credential.
    pub token: String,
    /// Default SQL warehouse for statement execution, if configured.
    pub warehouse_id: Option<String>,
}

impl Settings {
    /// Load settings from the environment, backfilled by `./.env`.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let mut vars = read_dotenv(Path::new(".env")).map_err(ConfigError::Dotenv)?;
        for key in [ENV_HOST, ENV_TOKEN, ENV_WAREHOUSE_ID] {
            if let Ok(value) = std::env::var(key) {
                vars.insert(key.to_string(), value);
            }
        }
        Self::from_vars(&vars)
    }

    /// Build settings from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> std::result::Result<Self, ConfigError> {
        let host = vars
            .get(ENV_HOST)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar(ENV_HOST))?;
        let host = validate_host(host)?;

        let token = vars
            .get(ENV_TOKEN)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar(ENV_TOKEN))?
            .trim()
            .to_string();

        let warehouse_id = vars
            .get(ENV_WAREHOUSE_ID)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(id) = &warehouse_id {
            if id.len() < 10 {
                tracing::warn!("Warehouse ID '{}' seems unusually short", id);
            }
        }

        Ok(Self {
            host,
            token,
            warehouse_id,
        })
    }
}

fn validate_host(raw: &str) -> std::result::Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidHost {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidHost {
            value: raw.to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn resolves_full_settings() {
        let settings = Settings::from_vars(&vars(&[
            (ENV_HOST, "https://example.databricks.net/"),
            (ENV_TOKEN, "dapi-secret"),
            (ENV_WAREHOUSE_ID, "warehouse-abc123"),
        ]))
        .unwrap();

        assert_eq!(settings.host, "https://example.databricks.net");
        assert_eq!(settings.token, "dapi-secret");
        assert_eq!(settings.warehouse_id.as_deref(), Some("warehouse-abc123"));
    }

    #[test]
    fn warehouse_is_optional() {
        let settings = Settings::from_vars(&vars(&[
            (ENV_HOST, "https://example.databricks.net"),
            (ENV_TOKEN, "dapi-secret"),
        ]))
        .unwrap();
        assert!(settings.warehouse_id.is_none());
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Settings::from_vars(&vars(&[(ENV_HOST, "https://x.databricks.net")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_TOKEN)));
    }

    #[test]
    fn rejects_non_http_host() {
        let err = Settings::from_vars(&vars(&[
            (ENV_HOST, "ftp://example.databricks.net"),
            (ENV_TOKEN, "dapi-secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { .. }));
    }

    #[test]
    fn rejects_unparseable_host() {
        let err = Settings::from_vars(&vars(&[
            (ENV_HOST, "not a url"),
            (ENV_TOKEN, "dapi-secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { .. }));
    }
}
