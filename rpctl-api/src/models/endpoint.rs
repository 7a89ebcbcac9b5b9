//! Serverless endpoint types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A serverless endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    /// Endpoint ID.
    pub id: String,
    /// Endpoint name.
    pub name: String,
    /// Template the workers run.
    pub template_id: String,
    /// GPU pool IDs.
    #[serde(alias = "gpuIds")]
    pub gpu_type_ids: Vec<String>,
    /// GPUs per worker.
    pub gpu_count: u32,
    /// Minimum workers.
    pub workers_min: u32,
    /// Maximum workers.
    pub workers_max: u32,
    /// Seconds a worker idles before scaling down.
    pub idle_timeout: u32,
    /// Allowed datacenters.
    pub data_center_ids: Vec<String>,
    /// Attached network volume.
    pub network_volume_id: Option<String>,
    /// `QUEUE_DELAY` or `REQUEST_COUNT`.
    pub scaler_type: String,
    /// Scaler threshold.
    pub scaler_value: u32,
    /// FlashBoot enabled.
    pub flashboot: bool,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}

/// Request body for creating an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCreateParams {
    /// Endpoint name.
    pub name: String,
    /// Template the workers run.
    pub template_id: String,
    /// GPU pool IDs.
    pub gpu_type_ids: Vec<String>,
    /// GPUs per worker.
    pub gpu_count: u32,
    /// Minimum workers.
    pub workers_min: u32,
    /// Maximum workers.
    pub workers_max: u32,
    /// Idle timeout in seconds.
    pub idle_timeout: u32,
    /// Scaler type.
    pub scaler_type: String,
    /// Scaler threshold.
    pub scaler_value: u32,
    /// Attached network volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_volume_id: Option<String>,
    /// FlashBoot enabled.
    pub flashboot: bool,
    /// Allowed datacenters.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub data_center_ids: Vec<String>,
    /// Allowed CUDA versions.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub allowed_cuda_versions: Vec<String>,
}

impl EndpointCreateParams {
    /// Params with the usual defaults.
    pub fn new(name: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_id: template_id.into(),
            gpu_type_ids: vec!["AMPERE_24".to_string()],
            gpu_count: 1,
            workers_min: 0,
            workers_max: 3,
            idle_timeout: 5,
            scaler_type: "QUEUE_DELAY".to_string(),
            scaler_value: 4,
            network_volume_id: None,
            flashboot: false,
            data_center_ids: Vec::new(),
            allowed_cuda_versions: Vec::new(),
        }
    }
}

/// Partial update for an endpoint. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointUpdateParams {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// New minimum workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers_min: Option<u32>,
    /// New maximum workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers_max: Option<u32>,
    /// New idle timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u32>,
}

impl EndpointUpdateParams {
    /// Whether nothing would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Worker and job counts reported by `/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointHealth {
    /// Job counters.
    pub jobs: JobCounts,
    /// Worker counters.
    pub workers: WorkerCounts,
}

/// Job counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobCounts {
    /// Completed jobs.
    pub completed: u64,
    /// Failed jobs.
    pub failed: u64,
    /// Jobs being processed.
    pub in_progress: u64,
    /// Queued jobs.
    pub in_queue: u64,
    /// Retried jobs.
    pub retried: u64,
}

/// Worker counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerCounts {
    /// Idle workers.
    pub idle: u64,
    /// Running workers.
    pub running: u64,
    /// Initializing workers.
    pub initializing: u64,
    /// Throttled workers.
    pub throttled: u64,
}

/// A serverless job as returned by `/run`, `/runsync` and `/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    /// Job ID.
    pub id: String,
    /// `IN_QUEUE`, `IN_PROGRESS`, `COMPLETED`, `FAILED`...
    pub status: String,
    /// Worker output, when finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error text reported by the worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Queue delay in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_time: Option<u64>,
    /// Execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
}

impl Job {
    /// Whether the job has reached a final state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status.as_str(),
            "COMPLETED" | "FAILED" | "CANCELLED" | "TIMED_OUT"
        )
    }
}

/// Result of `/purge-queue`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeResult {
    /// Jobs removed from the queue.
    pub removed: u64,
    /// Status text.
    pub status: String,
}
