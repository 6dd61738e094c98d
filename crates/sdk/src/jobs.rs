//! Job and run management, including one-time notebook runs.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::info;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

/// Default ceiling when waiting for a run to terminate.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(600);
/// Default delay between run-state polls.
pub const DEFAULT_RUN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Create a job from a raw configuration payload (name plus task list).
pub async fn create_job(client: &ApiClient, job_config: &Value) -> Result<Value> {
    info!("Creating new job");
    client.post("/api/2.2/jobs/create", job_config).await
}

/// Trigger an existing job, optionally with notebook parameters.
pub async fn run_job(
    client: &ApiClient,
    job_id: i64,
    notebook_params: Option<&Value>,
) -> Result<Value> {
    info!(job_id, "Running job");
    let mut payload = json!({ "job_id": job_id });
    if let Some(params) = notebook_params {
        payload["notebook_params"] = params.clone();
    }
    client.post("/api/2.0/jobs/run-now", &payload).await
}

/// List all jobs.
pub async fn list_jobs(client: &ApiClient) -> Result<Value> {
    info!("Listing all jobs");
    client.get("/api/2.0/jobs/list", &[]).await
}

/// Get a job's configuration.
pub async fn get_job(client: &ApiClient, job_id: i64) -> Result<Value> {
    info!(job_id, "Getting job info");
    client
        .get("/api/2.0/jobs/get", &[("job_id", job_id.to_string())])
        .await
}

/// Replace a job's settings.
pub async fn update_job(client: &ApiClient, job_id: i64, new_settings: &Value) -> Result<Value> {
    info!(job_id, "Updating job");
    client
        .post(
            "/api/2.0/jobs/update",
            &json!({ "job_id": job_id, "new_settings": new_settings }),
        )
        .await
}

/// Delete a job.
pub async fn delete_job(client: &ApiClient, job_id: i64) -> Result<Value> {
    info!(job_id, "Deleting job");
    client
        .post("/api/2.2/jobs/delete", &json!({ "job_id": job_id }))
        .await
}

/// Get full information about a run.
pub async fn get_run(client: &ApiClient, run_id: i64) -> Result<Value> {
    client
        .get("/api/2.1/jobs/runs/get", &[("run_id", run_id.to_string())])
        .await
}

/// List recent runs, optionally restricted to one job.
pub async fn list_runs(client: &ApiClient, job_id: Option<i64>, limit: u32) -> Result<Value> {
    info!("Listing job runs");
    let mut query = vec![("limit", limit.to_string())];
    if let Some(job_id) = job_id {
        query.push(("job_id", job_id.to_string()));
    }
    client.get("/api/2.1/jobs/runs/list", &query).await
}

/// Condensed state for a run: result state when finished, life-cycle state
/// otherwise.
pub async fn get_run_status(client: &ApiClient, run_id: i64) -> Result<Value> {
    let run = get_run(client, run_id).await?;
    let state = run.get("state").cloned().unwrap_or_else(|| json!({}));
    Ok(json!({
        "run_id": run_id,
        "state": state.get("result_state").or_else(|| state.get("life_cycle_state")),
        "life_cycle": state.get("life_cycle_state"),
    }))
}

/// Cancel a run.
pub async fn cancel_run(client: &ApiClient, run_id: i64) -> Result<Value> {
    info!(run_id, "Cancelling run");
    client
        .post("/api/2.1/jobs/runs/cancel", &json!({ "run_id": run_id }))
        .await
}

/// Submit a one-time run.
pub async fn submit_run(client: &ApiClient, run_config: &Value) -> Result<Value> {
    info!("Submitting one-time run");
    client.post("/api/2.0/jobs/runs/submit", run_config).await
}

/// Fetch the output of a finished run.
pub async fn get_run_output(client: &ApiClient, run_id: i64) -> Result<Value> {
    info!(run_id, "Fetching run output");
    client
        .get(
            "/api/2.0/jobs/runs/get-output",
            &[("run_id", run_id.to_string())],
        )
        .await
}

/// Poll a run until it reaches `desired_state` or the timeout elapses.
///
/// The deadline is measured from the first poll; a run that never reaches
/// the state within `timeout` is an invalid-input-shaped timeout error, since
/// job runs (unlike Genie turns) have no meaningful partial result to return.
pub async fn await_until_state(
    client: &ApiClient,
    run_id: i64,
    desired_state: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Value> {
    let started = Instant::now();
    loop {
        let run = get_run(client, run_id).await?;
        let state = run
            .pointer("/state/life_cycle_state")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if state == desired_state {
            return Ok(run);
        }
        if started.elapsed() >= timeout {
            return Err(ApiError::InvalidInput(format!(
                "run {run_id} did not reach state {desired_state} within {}s",
                timeout.as_secs()
            )));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Submit a one-time notebook run, wait for it to terminate, and return its
/// output annotated with the run id.
pub async fn run_notebook(
    client: &ApiClient,
    notebook_path: &str,
    existing_cluster_id: Option<&str>,
    base_parameters: Option<&Value>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Value> {
    let mut task = json!({
        "task_key": "run_notebook",
        "notebook_task": { "notebook_path": notebook_path },
    });
    if let Some(params) = base_parameters {
        task["notebook_task"]["base_parameters"] = params.clone();
    }
    if let Some(cluster_id) = existing_cluster_id {
        task["existing_cluster_id"] = json!(cluster_id);
    }

    let submit_response = submit_run(client, &json!({ "tasks": [task] })).await?;
    let run_id = submit_response
        .get("run_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::Decode {
            path: "/api/2.0/jobs/runs/submit".to_string(),
            message: "submit response missing run_id".to_string(),
        })?;

    await_until_state(client, run_id, "TERMINATED", timeout, poll_interval).await?;
    let mut output = get_run_output(client, run_id).await?;
    output["run_id"] = json!(run_id);
    Ok(output)
}
