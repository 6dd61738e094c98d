//! Authenticated HTTP transport for the Databricks REST API.
//!
//! [`ApiClient`] owns a pooled `reqwest` client with the bearer credential
//! attached as a default header. Every API module in this crate goes through
//! [`ApiClient::request`]; there is no retry, caching or ordering logic here.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ApiError, Result};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// HTTP client for a single Databricks workspace.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given workspace host and access token.
    ///
    /// The token is baked into the client's default headers; callers of the
    /// API modules never handle the credential again.
    pub fn new(host: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| ApiError::InvalidInput(format!("invalid API token: {err}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| ApiError::InvalidInput(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from resolved [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.host, &settings.token)
    }

    /// Workspace base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with the given query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.request(Method::GET, path, None, query).await
    }

    /// POST `path` with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    /// PATCH `path` with a JSON body.
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::PATCH, path, Some(body), &[]).await
    }

    /// Perform one authenticated exchange and parse the JSON response.
    ///
    /// An empty success body decodes as `{}` (several Databricks endpoints
    /// answer `200` with no content). Request bodies are not logged.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.url_for(path);
        debug!(%method, %url, has_body = body.is_some(), "Databricks API request");

        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| ApiError::Network {
            method: method.to_string(),
            path: path.to_string(),
            source: err,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| ApiError::Network {
            method: method.to_string(),
            path: path.to_string(),
            source: err,
        })?;

        if !status.is_success() {
            debug!(%status, path, "Databricks API error response");
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
                detail: extract_error_detail(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&text).map_err(|err| ApiError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

/// Pull a human-readable message out of a Databricks error body.
///
/// Error payloads vary between `{"error": "..."}`, `{"message": "..."}` and
/// `{"error_code": ..., "message": ...}`; fall back to the raw body.
fn extract_error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error detail supplied".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), "dapi-test-token").unwrap()
    }

    #[tokio::test]
    async fn get_attaches_bearer_token_and_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/clusters/get"))
            .and(header("authorization", "Bearer dapi-test-token"))
            .and(query_param("cluster_id", "c-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cluster_id": "c-1"})))
            .mount(&server)
            .await;

        let value = test_client(&server)
            .get("/api/2.0/clusters/get", &[("cluster_id", "c-1".to_string())])
            .await
            .unwrap();
        assert_eq!(value["cluster_id"], "c-1");
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/clusters/delete"))
            .and(body_json(json!({"cluster_id": "c-2"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let value = test_client(&server)
            .post("/api/2.0/clusters/delete", &json!({"cluster_id": "c-2"}))
            .await
            .unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/jobs/list"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "internal failure"})),
            )
            .mount(&server)
            .await;

        let err = test_client(&server)
            .get("/api/2.0/jobs/list", &[])
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, detail, .. } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(detail, "internal failure");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/jobs/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .get("/api/2.0/jobs/list", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn error_detail_falls_back_to_raw_body() {
        assert_eq!(extract_error_detail("plain text"), "plain text");
        assert_eq!(
            extract_error_detail(r#"{"error": "denied"}"#),
            "denied"
        );
        assert_eq!(extract_error_detail(""), "no error detail supplied");
    }
}
