//! Serverless endpoint management and job submission.

use crate::poll::{poll_until, PollOptions, PollState};
use rpctl_api::models::{
    Endpoint, EndpointCreateParams, EndpointHealth, EndpointUpdateParams, Job, PurgeResult,
};
use rpctl_api::{RestClient, RUN_SYNC_TIMEOUT};
use rpctl_retries::{RpctlError, RpctlResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Endpoint operations on top of the REST client.
#[derive(Debug, Clone)]
pub struct EndpointService {
    client: Arc<RestClient>,
}

impl EndpointService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List endpoints.
    pub async fn list(&self) -> RpctlResult<Vec<Endpoint>> {
        self.client.list_endpoints().await
    }

    /// Fetch one endpoint.
    pub async fn get(&self, endpoint_id: &str) -> RpctlResult<Endpoint> {
        self.client.get_endpoint(endpoint_id).await
    }

    /// Create an endpoint.
    pub async fn create(&self, params: &EndpointCreateParams) -> RpctlResult<Endpoint> {
        if params.workers_min > params.workers_max {
            return Err(RpctlError::validation(format!(
                "--workers-min ({}) cannot exceed --workers-max ({}).",
                params.workers_min, params.workers_max
            )));
        }
        let endpoint = self.client.create_endpoint(params).await?;
        info!(endpoint = %endpoint, "Created endpoint");
        Ok(endpoint)
    }

    /// Update an endpoint. At least one field must be set.
    pub async fn update(&self, endpoint_id: &str, params: &EndpointUpdateParams) -> RpctlResult<Endpoint> {
        if params.is_empty() {
            return Err(RpctlError::validation("Nothing to update."));
        }
        self.client.update_endpoint(endpoint_id, params).await
    }

    /// Delete an endpoint.
    pub async fn delete(&self, endpoint_id: &str) -> RpctlResult<()> {
        self.client.delete_endpoint(endpoint_id).await?;
        info!(endpoint_id, "Deleted endpoint");
        Ok(())
    }

    /// Worker and queue health.
    pub async fn health(&self, endpoint_id: &str) -> RpctlResult<EndpointHealth> {
        self.client.endpoint_health(endpoint_id).await
    }

    /// Submit a job. `sync` waits for the output, otherwise the queued job
    /// comes back at once.
    pub async fn run(&self, endpoint_id: &str, input: Value, sync: bool) -> RpctlResult<Job> {
        if sync {
            self.client.run_sync(endpoint_id, input, RUN_SYNC_TIMEOUT).await
        } else {
            self.client.run_async(endpoint_id, input).await
        }
    }

    /// Current state of a job.
    pub async fn job_status(&self, endpoint_id: &str, job_id: &str) -> RpctlResult<Job> {
        self.client.job_status(endpoint_id, job_id).await
    }

    /// Poll a job until it reaches a final state.
    pub async fn wait_for_job(&self, endpoint_id: &str, job_id: &str, options: &PollOptions) -> RpctlResult<Job> {
        poll_until(options, move || async move {
            let job = self.client.job_status(endpoint_id, job_id).await?;
            let status = job.status.clone();
            Ok(if job.is_finished() {
                PollState::ready(status, job)
            } else {
                PollState::pending(status)
            })
        })
        .await
    }

    /// Drop every queued job.
    pub async fn purge_queue(&self, endpoint_id: &str) -> RpctlResult<PurgeResult> {
        let result = self.client.purge_queue(endpoint_id).await?;
        info!(endpoint_id, removed = result.removed, "Purged queue");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpctl_retries::RetryPolicy;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> EndpointService {
        let client = RestClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri())
            .with_serverless_url(server.uri())
            .with_policy(RetryPolicy::no_retry());
        EndpointService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_worker_range() {
        let server = MockServer::start().await;
        let mut params = EndpointCreateParams::new("whisper", "tpl-1");
        params.workers_min = 4;
        params.workers_max = 2;

        let err = service_for(&server).create(&params).await.unwrap_err();
        assert!(matches!(err, RpctlError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let server = MockServer::start().await;
        let err = service_for(&server)
            .update("ep-1", &EndpointUpdateParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Nothing to update.");
    }

    #[tokio::test]
    async fn test_run_async_then_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ep-1/run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-1",
                "status": "IN_QUEUE"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ep-1/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-1",
                "status": "IN_PROGRESS"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ep-1/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-1",
                "status": "COMPLETED",
                "output": [1, 2, 3]
            })))
            .mount(&server)
            .await;

        let service = service_for(&server);
        let job = service.run("ep-1", json!({"n": 3}), false).await.unwrap();
        assert_eq!(job.status, "IN_QUEUE");

        let options = PollOptions::new("job-1").interval(Duration::from_millis(10));
        let done = service.wait_for_job("ep-1", &job.id, &options).await.unwrap();
        assert_eq!(done.output, Some(json!([1, 2, 3])));
    }
}
