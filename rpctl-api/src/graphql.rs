//! GraphQL client for capacity, availability and account queries.

use crate::models::{CpuType, Datacenter, GpuType, User};
use crate::queries;
use reqwest::Client;
use rpctl_retries::{check_response, with_retry, RetryPolicy, RpctlError, RpctlResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// RunPod GraphQL endpoint.
pub const GRAPHQL_URL: &str = "https://api.runpod.io/graphql";

/// Per-request timeout for API calls.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

/// GraphQL client. Every request goes through the retry engine.
#[derive(Clone)]
pub struct GraphQLClient {
    client: Client,
    api_key: String,
    url: String,
    policy: RetryPolicy,
}

impl fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("url", &self.url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl GraphQLClient {
    /// Create a client for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> RpctlResult<Self> {
        let client = Client::builder().timeout(DEFAULT_API_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: GRAPHQL_URL.to_string(),
            policy: RetryPolicy::default(),
        })
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
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

    /// Execute a query and return its `data` object.
    ///
    /// A response carrying an `errors` array fails with the joined
    /// messages and is not retried.
    pub async fn execute(&self, query: &str, variables: Option<Value>) -> RpctlResult<Value> {
        let variables = variables.as_ref();
        with_retry(&self.policy, move || self.execute_once(query, variables)).await
    }

    async fn execute_once(&self, query: &str, variables: Option<&Value>) -> RpctlResult<Value> {
        let mut payload = json!({ "query": query });
        if let Some(vars) = variables.filter(|v| !is_empty(v)) {
            payload["variables"] = vars.clone();
        }

        debug!(operation = operation_name(query), "GraphQL request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body: GraphQLResponse = check_response(response).await?.json().await?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            return Err(RpctlError::from_graphql_errors(errors.iter().map(error_message)));
        }

        Ok(body.data.unwrap_or_else(|| json!({})))
    }

    /// List every GPU type with pricing and stock.
    pub async fn gpu_types(&self) -> RpctlResult<Vec<GpuType>> {
        let data = self.execute(queries::GPU_TYPES_LIST, None).await?;
        Ok(take(data, "/gpuTypes")?.unwrap_or_default())
    }

    /// Availability of one GPU type. `None` when the type is unknown.
    pub async fn gpu_availability(
        &self,
        gpu_type_id: &str,
        gpu_count: u32,
        secure_cloud: Option<bool>,
    ) -> RpctlResult<Option<GpuType>> {
        let mut variables = json!({ "gpuTypeId": gpu_type_id, "gpuCount": gpu_count });
        if let Some(secure) = secure_cloud {
            variables["secureCloud"] = json!(secure);
        }
        let data = self.execute(queries::GPU_TYPE_AVAILABILITY, Some(variables)).await?;
        let types: Vec<GpuType> = take(data, "/gpuTypes")?.unwrap_or_default();
        Ok(types.into_iter().next())
    }

    /// List CPU types.
    pub async fn cpu_types(&self) -> RpctlResult<Vec<CpuType>> {
        let data = self.execute(queries::CPU_TYPES_LIST, None).await?;
        Ok(take(data, "/cpuTypes")?.unwrap_or_default())
    }

    /// List datacenters with GPU availability.
    pub async fn datacenters(&self) -> RpctlResult<Vec<Datacenter>> {
        let data = self.execute(queries::DATACENTER_AVAILABILITY, None).await?;
        Ok(take(data, "/myself/datacenters")?.unwrap_or_default())
    }

    /// The authenticated account.
    pub async fn myself(&self) -> RpctlResult<User> {
        let data = self.execute(queries::MYSELF, None).await?;
        take(data, "/myself")?.ok_or_else(|| RpctlError::api("Account information missing from response"))
    }

    /// Replace the account's SSH public keys.
    pub async fn update_user_settings(&self, pubkey: &str) -> RpctlResult<User> {
        let data = self
            .execute(queries::UPDATE_USER_SETTINGS, Some(json!({ "pubkey": pubkey })))
            .await?;
        Ok(take(data, "/updateUserSettings")?.unwrap_or_default())
    }
}

/// Deserialize the value at `pointer`, treating missing and null alike.
fn take<T: DeserializeOwned>(mut data: Value, pointer: &str) -> RpctlResult<Option<T>> {
    match data.pointer_mut(pointer).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

fn operation_name(query: &str) -> &str {
    query
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(3)
            .base_delay(Duration::from_millis(5))
            .max_delay(Duration::from_millis(20))
    }

    async fn client_for(server: &MockServer) -> GraphQLClient {
        GraphQLClient::new("test-key")
            .unwrap()
            .with_url(server.uri())
            .with_policy(fast_policy())
    }

    #[tokio::test]
    async fn test_execute_returns_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"gpuTypes": [{"id": "NVIDIA A40", "memoryInGb": 48}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let gpus = client.gpu_types().await.unwrap();
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].memory_in_gb, 48);
    }

    #[tokio::test]
    async fn test_graphql_errors_are_joined_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "bad field"}, {"message": "no access"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.execute("query { x }", None).await.unwrap_err();
        assert_eq!(err.to_string(), "GraphQL error: bad field; no access");
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_data_is_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.execute("query { x }", None).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_unauthorized_fails_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.myself().await.unwrap_err();
        assert!(matches!(err, RpctlError::Authentication { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"myself": {"id": "user-1", "clientBalance": 12.5}}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let user = client.myself().await.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.client_balance, 12.5);
    }

    #[tokio::test]
    async fn test_availability_sends_variables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": {"gpuTypeId": "NVIDIA A40", "gpuCount": 2, "secureCloud": true}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"gpuTypes": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let gpu = client
            .gpu_availability("NVIDIA A40", 2, Some(true))
            .await
            .unwrap();
        assert!(gpu.is_none());
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name(queries::CPU_TYPES_LIST), "query CpuTypes {");
    }
}
