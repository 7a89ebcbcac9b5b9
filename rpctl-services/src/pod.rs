//! Pod management.

use crate::parallel::{parallel_map, sequential_map, BatchOptions, BatchResult};
use crate::poll::{poll_until, PollOptions, PollState};
use rpctl_api::models::{Pod, PodCreateParams};
use rpctl_api::RestClient;
use rpctl_retries::RpctlResult;
use std::sync::Arc;
use tracing::info;

/// Status a pod reports once its container is up.
pub const RUNNING: &str = "RUNNING";

/// Which pod action a bulk call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Stop each pod.
    Stop,
    /// Terminate each pod.
    Delete,
}

/// Pod operations on top of the REST client.
#[derive(Debug, Clone)]
pub struct PodService {
    client: Arc<RestClient>,
}

impl PodService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List pods, keeping only those whose status matches `status`.
    ///
    /// Matching is case-insensitive; `"all"` keeps everything.
    pub async fn list(&self, status: Option<&str>) -> RpctlResult<Vec<Pod>> {
        let pods = self.client.list_pods().await?;
        Ok(match status {
            Some(filter) if !filter.eq_ignore_ascii_case("all") => pods
                .into_iter()
                .filter(|p| p.status().eq_ignore_ascii_case(filter))
                .collect(),
            _ => pods,
        })
    }

    /// Fetch one pod.
    pub async fn get(&self, pod_id: &str) -> RpctlResult<Pod> {
        self.client.get_pod(pod_id).await
    }

    /// Validate `params` and create a pod.
    pub async fn create(&self, params: &PodCreateParams) -> RpctlResult<Pod> {
        params.validate()?;
        let pod = self.client.create_pod(params).await?;
        info!(pod = %pod, "Created pod");
        Ok(pod)
    }

    /// Stop a pod.
    pub async fn stop(&self, pod_id: &str) -> RpctlResult<()> {
        self.client.stop_pod(pod_id).await?;
        info!(pod_id, "Stopped pod");
        Ok(())
    }

    /// Start a stopped pod.
    pub async fn start(&self, pod_id: &str) -> RpctlResult<()> {
        self.client.start_pod(pod_id).await?;
        info!(pod_id, "Started pod");
        Ok(())
    }

    /// Restart a pod: stop, then start.
    pub async fn restart(&self, pod_id: &str) -> RpctlResult<()> {
        self.client.stop_pod(pod_id).await?;
        self.client.start_pod(pod_id).await?;
        info!(pod_id, "Restarted pod");
        Ok(())
    }

    /// Terminate a pod.
    pub async fn delete(&self, pod_id: &str) -> RpctlResult<()> {
        self.client.terminate_pod(pod_id).await?;
        info!(pod_id, "Terminated pod");
        Ok(())
    }

    /// Poll until the pod reports `RUNNING` and return it.
    pub async fn wait_until_running(&self, pod_id: &str, options: &PollOptions) -> RpctlResult<Pod> {
        poll_until(options, move || async move {
            let pod = self.client.get_pod(pod_id).await?;
            let status = pod.status().to_string();
            Ok(if status == RUNNING {
                PollState::ready(status, pod)
            } else {
                PollState::pending(status)
            })
        })
        .await
    }

    /// Stop or terminate many pods.
    ///
    /// `parallel` routes through the bounded batch executor; otherwise the
    /// pods are handled one at a time. Succeeded entries are pod IDs.
    pub async fn bulk(
        &self,
        action: BulkAction,
        pod_ids: Vec<String>,
        options: BatchOptions,
        parallel: bool,
    ) -> RpctlResult<BatchResult<String, String>> {
        if parallel {
            let service = self.clone();
            parallel_map(pod_ids, options, move |id| {
                let service = service.clone();
                async move { service.apply(action, id).await }
            })
            .await
        } else {
            sequential_map(pod_ids, options.stop_on_error, move |id| self.apply(action, id)).await
        }
    }

    /// Stop many pods. See [`PodService::bulk`].
    pub async fn stop_many(
        &self,
        pod_ids: Vec<String>,
        options: BatchOptions,
        parallel: bool,
    ) -> RpctlResult<BatchResult<String, String>> {
        self.bulk(BulkAction::Stop, pod_ids, options, parallel).await
    }

    /// Terminate many pods. See [`PodService::bulk`].
    pub async fn delete_many(
        &self,
        pod_ids: Vec<String>,
        options: BatchOptions,
        parallel: bool,
    ) -> RpctlResult<BatchResult<String, String>> {
        self.bulk(BulkAction::Delete, pod_ids, options, parallel).await
    }

    async fn apply(&self, action: BulkAction, pod_id: String) -> RpctlResult<String> {
        match action {
            BulkAction::Stop => self.stop(&pod_id).await?,
            BulkAction::Delete => self.delete(&pod_id).await?,
        }
        Ok(pod_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpctl_retries::{RetryPolicy, RpctlError};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> PodService {
        let policy = RetryPolicy::new()
            .max_attempts(2)
            .base_delay(Duration::from_millis(5))
            .max_delay(Duration::from_millis(10));
        let client = RestClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri())
            .with_policy(policy);
        PodService::new(Arc::new(client))
    }

    fn pod(id: &str, status: &str) -> serde_json::Value {
        json!({"id": id, "name": id, "desiredStatus": status, "runtime": {"status": status}})
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pods"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pod("a", "RUNNING"),
                pod("b", "EXITED"),
                pod("c", "RUNNING")
            ])))
            .mount(&server)
            .await;

        let service = service_for(&server);
        assert_eq!(service.list(Some("running")).await.unwrap().len(), 2);
        assert_eq!(service.list(Some("all")).await.unwrap().len(), 3);
        assert_eq!(service.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_validates_before_calling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = service_for(&server)
            .create(&PodCreateParams::new(""))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_wait_until_running() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pods/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod("p1", "CREATED")))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pods/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod("p1", "RUNNING")))
            .mount(&server)
            .await;

        let options = PollOptions::new("p1")
            .timeout(Duration::from_secs(5))
            .interval(Duration::from_millis(10));
        let pod = service_for(&server)
            .wait_until_running("p1", &options)
            .await
            .unwrap();
        assert!(pod.is_running());
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_wait_times_out_with_last_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pods/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod("p1", "CREATED")))
            .mount(&server)
            .await;

        let options = PollOptions::new("p1")
            .timeout(Duration::from_millis(50))
            .interval(Duration::from_millis(20));
        let err = service_for(&server)
            .wait_until_running("p1", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, RpctlError::PollTimeout { ref last_status, .. } if last_status == "CREATED"));
    }

    #[tokio::test]
    async fn test_stop_many_parallel_reports_each_failure() {
        let server = MockServer::start().await;
        for id in ["p1", "p3"] {
            Mock::given(method("POST"))
                .and(path(format!("/pods/{id}/stop")))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/pods/p2/stop"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ids = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
        let result = service_for(&server)
            .stop_many(ids, BatchOptions::new().max_workers(3), true)
            .await
            .unwrap();

        assert_eq!(result.total(), 3);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, "p2");
        assert_eq!(result.failed[0].1.to_string(), "Pod 'p2' not found.");
        assert_eq!(result.first_exit_code(), Some(5));
    }

    #[tokio::test]
    async fn test_restart_stops_then_starts() {
        let server = MockServer::start().await;
        for action in ["stop", "start"] {
            Mock::given(method("POST"))
                .and(path(format!("/pods/p1/{action}")))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }

        service_for(&server).restart("p1").await.unwrap();

        let paths: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(paths, vec!["/pods/p1/stop", "/pods/p1/start"]);
    }

    #[tokio::test]
    async fn test_delete_many_sequential_stop_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/pods/p1"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/pods/p2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ids = vec!["p1".to_string(), "p2".to_string()];
        let err = service_for(&server)
            .delete_many(ids, BatchOptions::new().stop_on_error(true), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RpctlError::BatchStopped { ref item, .. } if item == "p1"));
    }
}
