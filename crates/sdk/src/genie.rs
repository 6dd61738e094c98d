//! Genie conversational query driver.
//!
//! Genie is the Databricks natural-language-to-SQL service. A conversation is
//! scoped to a remote space; each turn is submitted, polled to a terminal
//! status, and (when the turn produced a query) resolved into the generated
//! SQL plus its result rows. Follow-up turns thread the `conversation_id`
//! returned by the first turn back through the same drive loop.
//!
//! Remote business failures and poll timeouts are expected outcomes of
//! well-formed input, so they come back as [`TurnOutcome`] variants rather
//! than errors; [`GenieError`] is reserved for transport failures, bad input
//! and malformed remote responses.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::ApiError;

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default ceiling on the time spent waiting for a terminal status.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Errors from the Genie subsystem.
#[derive(Debug, Error)]
pub enum GenieError {
    /// Transport-level failure; the outcome of the turn is unknown.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Caller-supplied input rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The remote response lacked a field the protocol requires.
    #[error("Genie response missing field `{0}`")]
    MissingField(&'static str),

    /// The remote reported a status string this client does not know.
    ///
    /// New statuses fail loudly instead of being polled forever.
    #[error("unrecognized Genie message status `{0}`")]
    UnrecognizedStatus(String),

    /// Results were requested for a message that cannot have any yet.
    #[error("message {message_id} has no fetchable results: {reason}")]
    InvalidState { message_id: String, reason: String },
}

/// How often and for how long a turn is polled.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl PollSettings {
    fn validate(&self) -> Result<(), GenieError> {
        if self.poll_interval.is_zero() {
            return Err(GenieError::InvalidInput(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_wait < self.poll_interval {
            return Err(GenieError::InvalidInput(
                "max_wait must be at least poll_interval".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote message status, mapped into a closed set at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    ExecutingQuery,
    Completed,
    Failed,
    Cancelled,
}

/// Classification driving the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Keep polling.
    NonTerminal,
    /// Stop; results may be fetched.
    SuccessTerminal,
    /// Stop; there are no results.
    FailureTerminal,
}

impl MessageStatus {
    /// Parse the remote's uppercase status string.
    pub fn parse(raw: &str) -> Result<Self, GenieError> {
        match raw {
            "PENDING" => Ok(Self::Pending),
            "EXECUTING_QUERY" => Ok(Self::ExecutingQuery),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(GenieError::UnrecognizedStatus(other.to_string())),
        }
    }

    pub fn classify(self) -> StatusClass {
        match self {
            Self::Pending | Self::ExecutingQuery => StatusClass::NonTerminal,
            Self::Completed => StatusClass::SuccessTerminal,
            Self::Failed | Self::Cancelled => StatusClass::FailureTerminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.classify() != StatusClass::NonTerminal
    }
}

/// A single tracked turn, as last reported by the remote service.
///
/// Never mutated locally; every field comes from a remote response.
#[derive(Debug, Clone, Serialize)]
pub struct PollableMessage {
    pub message_id: String,
    pub status: MessageStatus,
    /// Identifier of the query-result artifact, present once the turn
    /// completed with a generated query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    /// SQL the service generated for this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    /// Conversational answer text, when the turn produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// Remote-supplied error detail for failed turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// Resolved query artifact for a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_text: Option<String>,
    /// Result rows as reported by the service; the row schema is
    /// remote-defined and passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Value>,
}

/// Final report of one conversational turn.
///
/// `failed`, `cancelled` and `timeout` are ordinary outcomes the caller
/// branches on, not errors. `accepted` is returned when the caller chose not
/// to wait; the carried status is whatever the initiating response reported,
/// which may already be terminal if the service resolved synchronously.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Completed {
        conversation_id: String,
        message_id: String,
        question: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sql_text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        rows: Option<Value>,
    },
    Failed {
        conversation_id: String,
        message_id: String,
        question: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_detail: Option<String>,
    },
    Cancelled {
        conversation_id: String,
        message_id: String,
        question: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_detail: Option<String>,
    },
    Timeout {
        conversation_id: String,
        message_id: String,
        question: String,
        last_status: MessageStatus,
    },
    Accepted {
        conversation_id: String,
        message_id: String,
        question: String,
        current_status: MessageStatus,
    },
}

/// List the Genie spaces available in the workspace.
pub async fn list_spaces(client: &ApiClient) -> Result<Value, ApiError> {
    info!("Listing Genie spaces");
    client.get("/api/2.0/genie/spaces", &[]).await
}

/// Start a new conversation and drive the first turn.
///
/// With `wait_for_result` the call polls until the turn reaches a terminal
/// status or `poll.max_wait` elapses; otherwise it returns immediately with
/// an `accepted` outcome carrying the initial status.
pub async fn start_conversation(
    client: &ApiClient,
    space_id: &str,
    question: &str,
    wait_for_result: bool,
    poll: PollSettings,
) -> Result<TurnOutcome, GenieError> {
    require_non_empty(space_id, "space_id")?;
    require_non_empty(question, "question")?;
    poll.validate()?;

    info!(space_id, "Starting Genie conversation");
    let submitted_at = Instant::now();
    let body = client
        .post(
            &format!("/api/2.0/genie/spaces/{space_id}/start-conversation"),
            &json!({ "content": question }),
        )
        .await?;

    let conversation_id = required_str(&body, "conversation_id")?;
    let message_id = required_str(&body, "message_id")?;
    let initial = parse_message(&body, &message_id)?;

    drive_turn(
        client,
        space_id,
        &conversation_id,
        question,
        initial,
        wait_for_result,
        poll,
        submitted_at,
    )
    .await
}

/// Send a follow-up turn against an existing conversation.
///
/// The caller's `conversation_id` is forwarded exactly as given; this client
/// never fabricates or rewrites conversation identity. Unknown identifiers
/// are rejected by the remote service.
pub async fn send_followup(
    client: &ApiClient,
    space_id: &str,
    conversation_id: &str,
    question: &str,
    wait_for_result: bool,
    poll: PollSettings,
) -> Result<TurnOutcome, GenieError> {
    require_non_empty(space_id, "space_id")?;
    require_non_empty(conversation_id, "conversation_id")?;
    require_non_empty(question, "question")?;
    poll.validate()?;

    info!(conversation_id, "Sending Genie follow-up");
    let submitted_at = Instant::now();
    let body = client
        .post(
            &format!("/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages"),
            &json!({ "content": question }),
        )
        .await?;

    let message_id = required_str(&body, "message_id")?;
    let initial = parse_message(&body, &message_id)?;

    drive_turn(
        client,
        space_id,
        conversation_id,
        question,
        initial,
        wait_for_result,
        poll,
        submitted_at,
    )
    .await
}

/// Fetch the current state of one turn. No polling.
pub async fn get_message_status(
    client: &ApiClient,
    space_id: &str,
    conversation_id: &str,
    message_id: &str,
) -> Result<PollableMessage, GenieError> {
    require_non_empty(space_id, "space_id")?;
    require_non_empty(conversation_id, "conversation_id")?;
    require_non_empty(message_id, "message_id")?;

    debug!(message_id, "Fetching Genie message status");
    let body = client
        .get(
            &format!(
                "/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages/{message_id}"
            ),
            &[],
        )
        .await?;
    if body.get("status").and_then(Value::as_str).is_none() {
        return Err(GenieError::MissingField("status"));
    }
    parse_message(&body, message_id)
}

/// Fetch the query result for a turn already observed as completed.
///
/// The gate is checked locally against the supplied message before any
/// request goes out: a message that is not success-terminal, or that carries
/// no query attachment, is a caller error rather than something to retry.
pub async fn get_query_results(
    client: &ApiClient,
    space_id: &str,
    conversation_id: &str,
    message: &PollableMessage,
) -> Result<QueryResult, GenieError> {
    require_non_empty(space_id, "space_id")?;
    require_non_empty(conversation_id, "conversation_id")?;

    if message.status.classify() != StatusClass::SuccessTerminal {
        return Err(GenieError::InvalidState {
            message_id: message.message_id.clone(),
            reason: "message has not completed".to_string(),
        });
    }
    let Some(attachment_id) = &message.attachment_id else {
        return Err(GenieError::InvalidState {
            message_id: message.message_id.clone(),
            reason: "message has no query attachment".to_string(),
        });
    };

    debug!(attachment_id, "Fetching Genie query results");
    let body = client
        .get(
            &format!(
                "/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages/{}/query-result/{attachment_id}",
                message.message_id
            ),
            &[],
        )
        .await?;

    Ok(QueryResult {
        sql_text: message.query_text.clone(),
        rows: extract_rows(&body),
    })
}

/// Shared poll-to-terminal loop for new and follow-up turns.
///
/// The deadline is measured from submission, not from the last poll, so
/// interval jitter cannot stretch the effective wait. Once a terminal status
/// is observed no further status request is issued for the message.
#[allow(clippy::too_many_arguments)]
async fn drive_turn(
    client: &ApiClient,
    space_id: &str,
    conversation_id: &str,
    question: &str,
    mut message: PollableMessage,
    wait_for_result: bool,
    poll: PollSettings,
    submitted_at: Instant,
) -> Result<TurnOutcome, GenieError> {
    if !wait_for_result {
        return Ok(TurnOutcome::Accepted {
            conversation_id: conversation_id.to_string(),
            message_id: message.message_id,
            question: question.to_string(),
            current_status: message.status,
        });
    }

    loop {
        match message.status.classify() {
            StatusClass::SuccessTerminal => {
                let result = if message.attachment_id.is_some() {
                    Some(get_query_results(client, space_id, conversation_id, &message).await?)
                } else {
                    // The turn answered conversationally without generating a
                    // query; that is a normal completion.
                    None
                };
                let (sql_text, rows) = match result {
                    Some(r) => (r.sql_text, r.rows),
                    None => (message.query_text.clone(), None),
                };
                info!(message_id = %message.message_id, "Genie turn completed");
                return Ok(TurnOutcome::Completed {
                    conversation_id: conversation_id.to_string(),
                    message_id: message.message_id,
                    question: question.to_string(),
                    response: message.response_text,
                    sql_text,
                    rows,
                });
            }
            StatusClass::FailureTerminal => {
                info!(message_id = %message.message_id, status = ?message.status, "Genie turn did not complete");
                let conversation_id = conversation_id.to_string();
                let question = question.to_string();
                return Ok(match message.status {
                    MessageStatus::Cancelled => TurnOutcome::Cancelled {
                        conversation_id,
                        message_id: message.message_id,
                        question,
                        error_detail: message.error_detail,
                    },
                    _ => TurnOutcome::Failed {
                        conversation_id,
                        message_id: message.message_id,
                        question,
                        error_detail: message.error_detail,
                    },
                });
            }
            StatusClass::NonTerminal => {
                if submitted_at.elapsed() >= poll.max_wait {
                    debug!(message_id = %message.message_id, "Genie poll deadline reached");
                    return Ok(TurnOutcome::Timeout {
                        conversation_id: conversation_id.to_string(),
                        message_id: message.message_id,
                        question: question.to_string(),
                        last_status: message.status,
                    });
                }
                tokio::time::sleep(poll.poll_interval).await;
                message =
                    get_message_status(client, space_id, conversation_id, &message.message_id)
                        .await?;
            }
        }
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), GenieError> {
    if value.trim().is_empty() {
        return Err(GenieError::InvalidInput(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

fn required_str(body: &Value, field: &'static str) -> Result<String, GenieError> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(GenieError::MissingField(field))
}

/// Build a [`PollableMessage`] from a remote message payload.
///
/// The initiating response may omit `status`; the message is then treated as
/// pending until the first status fetch says otherwise.
fn parse_message(body: &Value, fallback_message_id: &str) -> Result<PollableMessage, GenieError> {
    let message_id = body
        .get("message_id")
        .or_else(|| body.get("id"))
        .and_then(Value::as_str)
        .unwrap_or(fallback_message_id)
        .to_string();

    let status = match body.get("status").and_then(Value::as_str) {
        Some(raw) => MessageStatus::parse(raw)?,
        None => MessageStatus::Pending,
    };

    let mut attachment_id = None;
    let mut query_text = None;
    if let Some(attachments) = body.get("attachments").and_then(Value::as_array) {
        for attachment in attachments {
            if query_text.is_none() {
                query_text = attachment
                    .pointer("/query/query")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            if attachment_id.is_none() {
                attachment_id = attachment
                    .get("attachment_id")
                    .or_else(|| attachment.get("id"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
        }
    }

    let response_text = body
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let error_detail = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(PollableMessage {
        message_id,
        status,
        attachment_id,
        query_text,
        response_text,
        error_detail,
    })
}

/// Rows live under `data_array`, either at the top level or nested inside a
/// statement response envelope depending on the API version.
fn extract_rows(body: &Value) -> Option<Value> {
    body.get("data_array")
        .or_else(|| body.pointer("/statement_response/result/data_array"))
        .cloned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), "dapi-test-token").unwrap()
    }

    fn fast_poll() -> PollSettings {
        PollSettings {
            poll_interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(1),
        }
    }

    fn running_body() -> Value {
        json!({"id": "m-1", "status": "EXECUTING_QUERY"})
    }

    fn completed_body_with_attachment() -> Value {
        json!({
            "id": "m-1",
            "status": "COMPLETED",
            "text": "Here are your top products.",
            "attachments": [
                {"id": "att-1", "query": {"query": "SELECT product, revenue FROM sales ORDER BY revenue DESC LIMIT 5"}}
            ]
        })
    }

    #[tokio::test]
    async fn start_conversation_polls_to_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .and(body_json(json!({"content": "top 5 products by revenue"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "conv-1",
                "message_id": "m-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Two non-terminal polls, then completion: exactly three status
        // fetches in total.
        Mock::given(method("GET"))
            .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(running_body()))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completed_body_with_attachment()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1/query-result/att-1",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data_array": [["widget", "1200.50"], ["gadget", "980.00"]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = start_conversation(
            &test_client(&server),
            "sp1",
            "top 5 products by revenue",
            true,
            fast_poll(),
        )
        .await
        .unwrap();

        match outcome {
            TurnOutcome::Completed {
                conversation_id,
                message_id,
                sql_text,
                rows,
                ..
            } => {
                assert_eq!(conversation_id, "conv-1");
                assert_eq!(message_id, "m-1");
                assert!(sql_text.unwrap().starts_with("SELECT"));
                assert_eq!(rows.unwrap().as_array().unwrap().len(), 2);
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_conversation_times_out_without_terminal_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "conv-1",
                "message_id": "m-1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(running_body()))
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let outcome = start_conversation(
            &test_client(&server),
            "sp1",
            "slow question",
            true,
            PollSettings {
                poll_interval: Duration::from_millis(10),
                max_wait: Duration::from_millis(120),
            },
        )
        .await
        .unwrap();

        match outcome {
            TurnOutcome::Timeout { last_status, .. } => {
                assert_eq!(last_status, MessageStatus::ExecutingQuery);
            }
            other => panic!("expected timeout outcome, got {other:?}"),
        }
        // Deadline plus at most one extra poll cycle.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn transport_error_on_initiation_propagates_without_polling() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "message": "internal error"
            })))
            .mount(&server)
            .await;

        let err = start_conversation(&test_client(&server), "sp1", "q", true, fast_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::Api(ApiError::Status { .. })));

        // The initiating call was the only request; no polls were attempted.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn followup_threads_conversation_identity() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-7/messages"))
            .and(body_json(json!({"content": "now show last quarter"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message_id": "m-9"
            })))
            .expect(1)
            .mount(&server)
            .await;
        // Completed turn without a query attachment: a conversational answer
        // only, which is a normal completion with no SQL or rows.
        Mock::given(method("GET"))
            .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-7/messages/m-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m-9",
                "status": "COMPLETED",
                "text": "Revenue was flat quarter over quarter."
            })))
            .mount(&server)
            .await;

        let outcome = send_followup(
            &test_client(&server),
            "sp1",
            "conv-7",
            "now show last quarter",
            true,
            fast_poll(),
        )
        .await
        .unwrap();

        match outcome {
            TurnOutcome::Completed {
                conversation_id,
                sql_text,
                rows,
                response,
                ..
            } => {
                assert_eq!(conversation_id, "conv-7");
                assert!(sql_text.is_none());
                assert!(rows.is_none());
                assert_eq!(
                    response.as_deref(),
                    Some("Revenue was flat quarter over quarter.")
                );
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_question_rejected_before_any_request() {
        let server = MockServer::start().await;

        let err = start_conversation(&test_client(&server), "sp1", "", true, fast_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_is_an_outcome_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "conv-1",
                "message_id": "m-1"
            })))
            .mount(&server)
            .await;
        // First and only poll reports failure; no further polling happens.
        Mock::given(method("GET"))
            .and(path("/api/2.0/genie/spaces/sp1/conversations/conv-1/messages/m-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "m-1",
                "status": "FAILED",
                "error": {"message": "could not generate a query"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = start_conversation(&test_client(&server), "sp1", "q", true, fast_poll())
            .await
            .unwrap();

        match outcome {
            TurnOutcome::Failed { error_detail, .. } => {
                assert_eq!(error_detail.as_deref(), Some("could not generate a query"));
            }
            other => panic!("expected failed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminal_status_in_initiating_response_skips_polling() {
        let server = MockServer::start().await;

        // The service resolved synchronously: the start response already
        // carries a terminal status, so no status fetch is ever issued.
        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "conv-1",
                "message_id": "m-1",
                "status": "COMPLETED",
                "text": "42"
            })))
            .mount(&server)
            .await;

        let outcome = start_conversation(&test_client(&server), "sp1", "q", true, fast_poll())
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fire_and_forget_returns_accepted_with_initial_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "conv-1",
                "message_id": "m-1"
            })))
            .mount(&server)
            .await;

        let outcome = start_conversation(&test_client(&server), "sp1", "q", false, fast_poll())
            .await
            .unwrap();
        match outcome {
            TurnOutcome::Accepted { current_status, .. } => {
                assert_eq!(current_status, MessageStatus::Pending);
            }
            other => panic!("expected accepted outcome, got {other:?}"),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unrecognized_status_fails_loudly() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "conv-1",
                "message_id": "m-1",
                "status": "RETICULATING"
            })))
            .mount(&server)
            .await;

        let err = start_conversation(&test_client(&server), "sp1", "q", true, fast_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::UnrecognizedStatus(_)));
    }

    #[tokio::test]
    async fn query_results_gated_on_message_state() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let pending = PollableMessage {
            message_id: "m-1".into(),
            status: MessageStatus::Pending,
            attachment_id: Some("att-1".into()),
            query_text: None,
            response_text: None,
            error_detail: None,
        };
        let err = get_query_results(&client, "sp1", "conv-1", &pending)
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::InvalidState { .. }));

        let no_attachment = PollableMessage {
            status: MessageStatus::Completed,
            attachment_id: None,
            ..pending
        };
        let err = get_query_results(&client, "sp1", "conv-1", &no_attachment)
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::InvalidState { .. }));

        // Neither gate failure reached the network.
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_identifiers_in_start_response_are_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/2.0/genie/spaces/sp1/start-conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message_id": "m-1"})))
            .mount(&server)
            .await;

        let err = start_conversation(&test_client(&server), "sp1", "q", true, fast_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::MissingField("conversation_id")));
    }

    #[test]
    fn poll_settings_validated() {
        let bad = PollSettings {
            poll_interval: Duration::ZERO,
            max_wait: Duration::from_secs(1),
        };
        assert!(bad.validate().is_err());

        let inverted = PollSettings {
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(1),
        };
        assert!(inverted.validate().is_err());

        assert!(PollSettings::default().validate().is_ok());
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            MessageStatus::parse("PENDING").unwrap().classify(),
            StatusClass::NonTerminal
        );
        assert_eq!(
            MessageStatus::parse("EXECUTING_QUERY").unwrap().classify(),
            StatusClass::NonTerminal
        );
        assert_eq!(
            MessageStatus::parse("COMPLETED").unwrap().classify(),
            StatusClass::SuccessTerminal
        );
        assert_eq!(
            MessageStatus::parse("FAILED").unwrap().classify(),
            StatusClass::FailureTerminal
        );
        assert_eq!(
            MessageStatus::parse("CANCELLED").unwrap().classify(),
            StatusClass::FailureTerminal
        );
        assert!(MessageStatus::Completed.is_terminal());
        assert!(!MessageStatus::Pending.is_terminal());
    }
}
