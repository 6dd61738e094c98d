use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the Databricks REST transport.
///
/// Transport failures are distinct from remote business outcomes: a
/// `Status` error means the HTTP exchange itself was rejected, while a
/// job run or Genie turn that the service reports as failed comes back
/// as ordinary data from the module that drove it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP exchange could not be completed at all.
    #[error("network error calling {method} {path}: {source}")]
    Network {
        method: String,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status code.
    #[error("Databricks API returned {status} for {path}: {detail}")]
    Status {
        status: StatusCode,
        path: String,
        detail: String,
    },

    /// The response body could not be parsed as JSON.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// Caller-supplied input was rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Status code of the failed exchange, when the server answered at all.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// A specialized `Result` for transport-level operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn status_error_display_names_path_and_code() {
        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            path: "/api/2.0/clusters/list".into(),
            detail: "boom".into(),
        };
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("/api/2.0/clusters/list"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn status_code_accessor() {
        let err = ApiError::Status {
            status: StatusCode::FORBIDDEN,
            path: "/x".into(),
            detail: String::new(),
        };
        assert_eq!(err.status_code(), Some(StatusCode::FORBIDDEN));

        let err = ApiError::InvalidInput("missing".into());
        assert_eq!(err.status_code(), None);
    }
}
