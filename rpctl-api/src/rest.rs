//! REST client for pods, endpoints, templates, volumes and registry auths.
//!
//! Resource management goes to the REST API; serverless job traffic goes
//! to the endpoint runtime API. Both use bearer auth and every call runs
//! through the retry engine.

use crate::graphql::DEFAULT_API_TIMEOUT;
use crate::models::{
    Endpoint, EndpointCreateParams, EndpointHealth, EndpointUpdateParams, Job, Pod,
    PodCreateParams, PurgeResult, RegistryAuth, RegistryAuthParams, Template, TemplateParams,
    Volume, VolumeCreateParams, VolumeUpdateParams,
};
use reqwest::{Client, Method};
use rpctl_retries::{check_response, with_retry, RetryPolicy, RpctlError, RpctlResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// RunPod REST API.
pub const REST_BASE_URL: &str = "https://rest.runpod.io/v1";

/// Serverless endpoint runtime API.
pub const SERVERLESS_BASE_URL: &str = "https://api.runpod.ai/v2";

/// Longest a synchronous serverless run may take.
pub const RUN_SYNC_TIMEOUT: Duration = Duration::from_secs(86_400);

/// REST client.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    api_key: String,
    base_url: String,
    serverless_url: String,
    policy: RetryPolicy,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("serverless_url", &self.serverless_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a client for the public APIs.
    pub fn new(api_key: impl Into<String>) -> RpctlResult<Self> {
        let client = Client::builder().timeout(DEFAULT_API_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: REST_BASE_URL.to_string(),
            serverless_url: SERVERLESS_BASE_URL.to_string(),
            policy: RetryPolicy::default(),
        })
    }

    /// Set the REST base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the serverless runtime base URL.
    #[must_use]
    pub fn with_serverless_url(mut self, url: impl Into<String>) -> Self {
        self.serverless_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // ========================================================================
    // Pods
    // ========================================================================

    /// List pods.
    pub async fn list_pods(&self) -> RpctlResult<Vec<Pod>> {
        self.list(self.rest_url("/pods")).await
    }

    /// Fetch one pod.
    pub async fn get_pod(&self, pod_id: &str) -> RpctlResult<Pod> {
        self.get_one(self.rest_url(&format!("/pods/{pod_id}")), "Pod", pod_id)
            .await
    }

    /// Create a pod.
    pub async fn create_pod(&self, params: &PodCreateParams) -> RpctlResult<Pod> {
        let created = self
            .call(Method::POST, self.rest_url("/pods"), Some(to_body(params)?), None)
            .await?;
        decode(created)
    }

    /// Stop a pod, keeping its volume.
    pub async fn stop_pod(&self, pod_id: &str) -> RpctlResult<()> {
        self.pod_action(pod_id, "stop").await
    }

    /// Start (resume) a stopped pod.
    pub async fn start_pod(&self, pod_id: &str) -> RpctlResult<()> {
        self.pod_action(pod_id, "start").await
    }

    /// Terminate a pod.
    pub async fn terminate_pod(&self, pod_id: &str) -> RpctlResult<()> {
        self.delete(self.rest_url(&format!("/pods/{pod_id}")), "Pod", pod_id)
            .await
    }

    async fn pod_action(&self, pod_id: &str, action: &str) -> RpctlResult<()> {
        self.call(
            Method::POST,
            self.rest_url(&format!("/pods/{pod_id}/{action}")),
            None,
            None,
        )
        .await
        .map_err(|e| e.or_not_found(format!("Pod '{pod_id}' not found.")))?;
        Ok(())
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// List serverless endpoints.
    pub async fn list_endpoints(&self) -> RpctlResult<Vec<Endpoint>> {
        self.list(self.rest_url("/endpoints")).await
    }

    /// Fetch one endpoint.
    pub async fn get_endpoint(&self, endpoint_id: &str) -> RpctlResult<Endpoint> {
        self.get_one(
            self.rest_url(&format!("/endpoints/{endpoint_id}")),
            "Endpoint",
            endpoint_id,
        )
        .await
    }

    /// Create an endpoint.
    pub async fn create_endpoint(&self, params: &EndpointCreateParams) -> RpctlResult<Endpoint> {
        let created = self
            .call(Method::POST, self.rest_url("/endpoints"), Some(to_body(params)?), None)
            .await?;
        decode(created)
    }

    /// Update an endpoint.
    pub async fn update_endpoint(
        &self,
        endpoint_id: &str,
        params: &EndpointUpdateParams,
    ) -> RpctlResult<Endpoint> {
        self.update(
            self.rest_url(&format!("/endpoints/{endpoint_id}")),
            to_body(params)?,
            "Endpoint",
            endpoint_id,
        )
        .await
    }

    /// Delete an endpoint.
    pub async fn delete_endpoint(&self, endpoint_id: &str) -> RpctlResult<()> {
        self.delete(
            self.rest_url(&format!("/endpoints/{endpoint_id}")),
            "Endpoint",
            endpoint_id,
        )
        .await
    }

    // ========================================================================
    // Serverless runtime
    // ========================================================================

    /// Worker and queue health of an endpoint.
    pub async fn endpoint_health(&self, endpoint_id: &str) -> RpctlResult<EndpointHealth> {
        self.get_one(
            self.serverless(endpoint_id, "health"),
            "Endpoint",
            endpoint_id,
        )
        .await
    }

    /// Run a job and wait for its output.
    pub async fn run_sync(&self, endpoint_id: &str, input: Value, timeout: Duration) -> RpctlResult<Job> {
        let job = self
            .call(
                Method::POST,
                self.serverless(endpoint_id, "runsync"),
                Some(json!({ "input": input })),
                Some(timeout),
            )
            .await
            .map_err(|e| e.or_not_found(format!("Endpoint '{endpoint_id}' not found.")))?;
        job_result(job)
    }

    /// Queue a job and return it without waiting.
    pub async fn run_async(&self, endpoint_id: &str, input: Value) -> RpctlResult<Job> {
        let job = self
            .call(
                Method::POST,
                self.serverless(endpoint_id, "run"),
                Some(json!({ "input": input })),
                None,
            )
            .await
            .map_err(|e| e.or_not_found(format!("Endpoint '{endpoint_id}' not found.")))?;
        job_result(job)
    }

    /// Current state of a job.
    pub async fn job_status(&self, endpoint_id: &str, job_id: &str) -> RpctlResult<Job> {
        let job = self
            .call(
                Method::GET,
                self.serverless(endpoint_id, &format!("status/{job_id}")),
                None,
                None,
            )
            .await
            .map_err(|e| e.or_not_found(format!("Job '{job_id}' not found.")))?;
        job_result(job)
    }

    /// Drop every queued job.
    pub async fn purge_queue(&self, endpoint_id: &str) -> RpctlResult<PurgeResult> {
        let result = self
            .call(
                Method::POST,
                self.serverless(endpoint_id, "purge-queue"),
                None,
                None,
            )
            .await
            .map_err(|e| e.or_not_found(format!("Endpoint '{endpoint_id}' not found.")))?;
        decode(result)
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// List templates.
    pub async fn list_templates(&self) -> RpctlResult<Vec<Template>> {
        self.list(self.rest_url("/templates")).await
    }

    /// Fetch one template.
    pub async fn get_template(&self, template_id: &str) -> RpctlResult<Template> {
        self.get_one(
            self.rest_url(&format!("/templates/{template_id}")),
            "Template",
            template_id,
        )
        .await
    }

    /// Create a template.
    pub async fn create_template(&self, params: &TemplateParams) -> RpctlResult<Template> {
        let created = self
            .call(Method::POST, self.rest_url("/templates"), Some(to_body(params)?), None)
            .await?;
        decode(created)
    }

    /// Replace a template's settings.
    pub async fn update_template(&self, template_id: &str, params: &TemplateParams) -> RpctlResult<Template> {
        self.update(
            self.rest_url(&format!("/templates/{template_id}")),
            to_body(params)?,
            "Template",
            template_id,
        )
        .await
    }

    /// Delete a template.
    pub async fn delete_template(&self, template_id: &str) -> RpctlResult<()> {
        self.delete(
            self.rest_url(&format!("/templates/{template_id}")),
            "Template",
            template_id,
        )
        .await
    }

    // ========================================================================
    // Network volumes
    // ========================================================================

    /// List network volumes.
    pub async fn list_volumes(&self) -> RpctlResult<Vec<Volume>> {
        self.list(self.rest_url("/networkvolumes")).await
    }

    /// Fetch one network volume.
    pub async fn get_volume(&self, volume_id: &str) -> RpctlResult<Volume> {
        self.get_one(
            self.rest_url(&format!("/networkvolumes/{volume_id}")),
            "Volume",
            volume_id,
        )
        .await
    }

    /// Create a network volume.
    pub async fn create_volume(&self, params: &VolumeCreateParams) -> RpctlResult<Volume> {
        let created = self
            .call(Method::POST, self.rest_url("/networkvolumes"), Some(to_body(params)?), None)
            .await?;
        decode(created)
    }

    /// Rename or grow a network volume.
    pub async fn update_volume(&self, volume_id: &str, params: &VolumeUpdateParams) -> RpctlResult<Volume> {
        self.update(
            self.rest_url(&format!("/networkvolumes/{volume_id}")),
            to_body(params)?,
            "Volume",
            volume_id,
        )
        .await
    }

    /// Delete a network volume.
    pub async fn delete_volume(&self, volume_id: &str) -> RpctlResult<()> {
        self.delete(
            self.rest_url(&format!("/networkvolumes/{volume_id}")),
            "Volume",
            volume_id,
        )
        .await
    }

    // ========================================================================
    // Container registry auths
    // ========================================================================

    /// List stored registry credentials.
    pub async fn list_registry_auths(&self) -> RpctlResult<Vec<RegistryAuth>> {
        self.list(self.rest_url("/containerregistryauth")).await
    }

    /// Fetch one registry credential.
    pub async fn get_registry_auth(&self, auth_id: &str) -> RpctlResult<RegistryAuth> {
        self.get_one(
            self.rest_url(&format!("/containerregistryauth/{auth_id}")),
            "Registry auth",
            auth_id,
        )
        .await
    }

    /// Store registry credentials.
    pub async fn create_registry_auth(&self, params: &RegistryAuthParams) -> RpctlResult<RegistryAuth> {
        let created = self
            .call(
                Method::POST,
                self.rest_url("/containerregistryauth"),
                Some(to_body(params)?),
                None,
            )
            .await?;
        decode(created)
    }

    /// Delete stored registry credentials.
    pub async fn delete_registry_auth(&self, auth_id: &str) -> RpctlResult<()> {
        self.delete(
            self.rest_url(&format!("/containerregistryauth/{auth_id}")),
            "Registry auth",
            auth_id,
        )
        .await
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn rest_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn serverless(&self, endpoint_id: &str, path: &str) -> String {
        format!("{}/{}/{}", self.serverless_url, endpoint_id, path)
    }

    async fn list<T: DeserializeOwned>(&self, url: String) -> RpctlResult<Vec<T>> {
        let value = self.call(Method::GET, url, None, None).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        decode(value)
    }

    async fn get_one<T: DeserializeOwned>(&self, url: String, kind: &str, id: &str) -> RpctlResult<T> {
        let missing = || format!("{kind} '{id}' not found.");
        let value = self
            .call(Method::GET, url, None, None)
            .await
            .map_err(|e| e.or_not_found(missing()))?;
        if is_blank(&value) {
            return Err(RpctlError::not_found(missing()));
        }
        decode(value)
    }

    async fn update<T: DeserializeOwned>(&self, url: String, body: Value, kind: &str, id: &str) -> RpctlResult<T> {
        let value = self
            .call(Method::PATCH, url, Some(body), None)
            .await
            .map_err(|e| e.or_not_found(format!("{kind} '{id}' not found.")))?;
        decode(value)
    }

    async fn delete(&self, url: String, kind: &str, id: &str) -> RpctlResult<()> {
        self.call(Method::DELETE, url, None, None)
            .await
            .map_err(|e| e.or_not_found(format!("{kind} '{id}' not found.")))?;
        Ok(())
    }

    async fn call(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> RpctlResult<Value> {
        let (method, url, body) = (&method, url.as_str(), body.as_ref());
        with_retry(&self.policy, move || self.request_once(method, url, body, timeout)).await
    }

    async fn request_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> RpctlResult<Value> {
        debug!(%method, url, "REST request");

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = check_response(request.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn to_body<T: Serialize>(params: &T) -> RpctlResult<Value> {
    serde_json::to_value(params).map_err(|e| RpctlError::validation(format!("Invalid request body: {e}")))
}

fn decode<T: DeserializeOwned>(value: Value) -> RpctlResult<T> {
    Ok(serde_json::from_value(value)?)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Decode a job, surfacing a worker-reported error through the taxonomy.
fn job_result(value: Value) -> RpctlResult<Job> {
    let job: Job = decode(value)?;
    match job.error.as_deref().map(str::trim) {
        Some(message) if !message.is_empty() => Err(RpctlError::from_message(message)),
        _ => Ok(job),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RestClient {
        let policy = RetryPolicy::new()
            .max_attempts(3)
            .base_delay(Duration::from_millis(5))
            .max_delay(Duration::from_millis(20));
        RestClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri())
            .with_serverless_url(format!("{}/v2", server.uri()))
            .with_policy(policy)
    }

    #[tokio::test]
    async fn test_list_pods() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pods"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "pod-1", "name": "a", "desiredStatus": "RUNNING"},
                {"id": "pod-2", "name": "b", "desiredStatus": "EXITED"}
            ])))
            .mount(&server)
            .await;

        let pods = client_for(&server).list_pods().await.unwrap();
        let ids: Vec<_> = pods.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pod-1", "pod-2"]);
    }

    #[tokio::test]
    async fn test_list_null_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/networkvolumes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert!(client_for(&server).list_volumes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_pod_404_names_the_pod() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pods/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).get_pod("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Pod 'missing' not found.");
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn test_get_template_empty_body_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/templates/t-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = client_for(&server).get_template("t-1").await.unwrap_err();
        assert!(matches!(err, RpctlError::ResourceNotFound { .. }));
        assert_eq!(err.to_string(), "Template 't-1' not found.");
    }

    #[tokio::test]
    async fn test_create_pod_sends_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pods"))
            .and(body_partial_json(json!({
                "imageName": "runpod/pytorch",
                "gpuCount": 1,
                "cloudType": "SECURE"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pod-9",
                "name": "rpctl-pod",
                "desiredStatus": "RUNNING"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pod = client_for(&server)
            .create_pod(&PodCreateParams::new("runpod/pytorch"))
            .await
            .unwrap();
        assert_eq!(pod.id, "pod-9");
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/endpoints"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0.01"))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/endpoints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "ep-1"}])))
            .mount(&server)
            .await;

        let endpoints = client_for(&server).list_endpoints().await.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_persistent_server_error_exhausts_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pods/pod-1/stop"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server).stop_pod("pod-1").await.unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/endpoints/ep-1"))
            .respond_with(ResponseTemplate::new(400).set_body_string("endpoint has workers"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).delete_endpoint("ep-1").await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));
    }

    #[tokio::test]
    async fn test_job_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/ep-1/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-1",
                "status": "FAILED",
                "error": "worker returned 503 Service Unavailable"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .job_status("ep-1", "job-1")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().starts_with("RunPod API error:"));
    }

    #[tokio::test]
    async fn test_run_sync_returns_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ep-1/runsync"))
            .and(body_partial_json(json!({"input": {"prompt": "hi"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "job-2",
                "status": "COMPLETED",
                "output": {"text": "hello"}
            })))
            .mount(&server)
            .await;

        let job = client_for(&server)
            .run_sync("ep-1", json!({"prompt": "hi"}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(job.output, Some(json!({"text": "hello"})));
    }

    #[tokio::test]
    async fn test_update_volume_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/networkvolumes/vol-1"))
            .and(body_partial_json(json!({"size": 100})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "vol-1",
                "name": "data",
                "size": 100,
                "dataCenterId": "EU-RO-1"
            })))
            .mount(&server)
            .await;

        let params = VolumeUpdateParams {
            size: Some(100),
            ..Default::default()
        };
        let volume = client_for(&server).update_volume("vol-1", &params).await.unwrap();
        assert_eq!(volume.size, 100);
        assert_eq!(volume.data_center_id, "EU-RO-1");
    }
}
