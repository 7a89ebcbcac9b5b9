//! Pod types.

use rpctl_retries::{RpctlError, RpctlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default container disk size in GB.
pub const DEFAULT_CONTAINER_DISK_GB: u32 = 50;
/// Default persistent volume size in GB.
pub const DEFAULT_VOLUME_DISK_GB: u32 = 20;
/// Default volume mount path.
pub const DEFAULT_VOLUME_MOUNT_PATH: &str = "/workspace";
/// Default exposed ports.
pub const DEFAULT_PORTS: &str = "8888/http,22/tcp";
/// Default minimum vCPUs per GPU.
pub const DEFAULT_MIN_VCPU_PER_GPU: u32 = 2;
/// Default minimum RAM per GPU in GB.
pub const DEFAULT_MIN_RAM_PER_GPU: u32 = 8;

/// A GPU or CPU pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pod {
    /// Pod ID.
    pub id: String,
    /// Pod name.
    pub name: String,
    /// Container image.
    pub image_name: String,
    /// Status the platform is driving the pod towards.
    pub desired_status: String,
    /// Live runtime info, absent until the container starts.
    pub runtime: Option<PodRuntime>,
    /// Attached GPUs.
    pub gpu: Option<PodGpu>,
    /// Number of vCPUs.
    pub vcpu_count: Option<f64>,
    /// Memory in GB.
    pub memory_in_gb: Option<f64>,
    /// Container disk in GB.
    pub container_disk_in_gb: Option<u32>,
    /// Persistent volume in GB.
    pub volume_in_gb: Option<u32>,
    /// Volume mount path.
    pub volume_mount_path: Option<String>,
    /// Hourly cost in USD.
    pub cost_per_hr: f64,
    /// Host machine ID.
    pub machine_id: Option<String>,
    /// Exposed ports, e.g. `8888/http`.
    pub ports: Vec<String>,
    /// Public IP, if one was assigned.
    pub public_ip: Option<String>,
    /// Environment variables.
    pub env: BTreeMap<String, String>,
}

/// Runtime section of a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodRuntime {
    /// Container status, e.g. `RUNNING`.
    pub status: Option<String>,
    /// Uptime in seconds.
    pub uptime_in_seconds: Option<u64>,
}

/// GPU section of a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodGpu {
    /// GPU type ID.
    pub id: String,
    /// Number of GPUs.
    pub count: u32,
    /// Display name.
    pub display_name: Option<String>,
}

impl Pod {
    /// Current status: the runtime status when known, else the desired one.
    pub fn status(&self) -> &str {
        self.runtime
            .as_ref()
            .and_then(|r| r.status.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.desired_status)
    }

    /// Whether the pod reports `RUNNING`.
    pub fn is_running(&self) -> bool {
        self.status().eq_ignore_ascii_case("running")
    }

    /// GPU display name or type ID.
    pub fn gpu_label(&self) -> String {
        match &self.gpu {
            Some(gpu) => {
                let name = gpu.display_name.as_deref().unwrap_or(&gpu.id);
                format!("{}x {}", gpu.count, name)
            }
            None => "-".to_string(),
        }
    }
}

impl fmt::Display for Pod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}

/// Compute type of a pod.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComputeType {
    /// GPU pod.
    #[default]
    Gpu,
    /// CPU-only pod.
    Cpu,
}

/// Cloud to place a pod in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudType {
    /// RunPod's secure cloud.
    #[default]
    Secure,
    /// Community cloud.
    Community,
}

impl std::str::FromStr for CloudType {
    type Err = RpctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secure" => Ok(Self::Secure),
            "community" => Ok(Self::Community),
            other => Err(RpctlError::validation(format!(
                "Invalid cloud type '{other}'. Use SECURE or COMMUNITY."
            ))),
        }
    }
}

/// Request body for creating a pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodCreateParams {
    /// Pod name.
    pub name: String,
    /// Container image.
    pub image_name: String,
    /// Acceptable GPU types, in order of preference.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub gpu_type_ids: Vec<String>,
    /// Number of GPUs.
    pub gpu_count: u32,
    /// Secure or community cloud.
    pub cloud_type: CloudType,
    /// GPU or CPU pod.
    pub compute_type: ComputeType,
    /// CPU flavors for CPU pods.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cpu_flavor_ids: Vec<String>,
    /// Container disk in GB.
    pub container_disk_in_gb: u32,
    /// Persistent volume in GB.
    pub volume_in_gb: u32,
    /// Volume mount path.
    pub volume_mount_path: String,
    /// Network volume to attach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_volume_id: Option<String>,
    /// Exposed ports.
    pub ports: Vec<String>,
    /// Environment variables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub env: BTreeMap<String, String>,
    /// Entrypoint override.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub docker_entrypoint: Vec<String>,
    /// Start command override.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub docker_start_cmd: Vec<String>,
    /// Template to start from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Minimum vCPUs per GPU.
    #[serde(rename = "minVCPUPerGPU")]
    pub min_vcpu_per_gpu: u32,
    /// Minimum RAM per GPU in GB.
    #[serde(rename = "minRAMPerGPU")]
    pub min_ram_per_gpu: u32,
    /// Allowed datacenters.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub data_center_ids: Vec<String>,
    /// Spot pricing.
    pub interruptible: bool,
    /// Allowed CUDA versions.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub allowed_cuda_versions: Vec<String>,
    /// Request a public IP.
    pub support_public_ip: bool,
}

impl PodCreateParams {
    /// Create params with defaults for everything but the image.
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            name: "rpctl-pod".to_string(),
            image_name: image_name.into(),
            gpu_type_ids: Vec::new(),
            gpu_count: 1,
            cloud_type: CloudType::default(),
            compute_type: ComputeType::default(),
            cpu_flavor_ids: Vec::new(),
            container_disk_in_gb: DEFAULT_CONTAINER_DISK_GB,
            volume_in_gb: DEFAULT_VOLUME_DISK_GB,
            volume_mount_path: DEFAULT_VOLUME_MOUNT_PATH.to_string(),
            network_volume_id: None,
            ports: parse_ports(DEFAULT_PORTS),
            env: BTreeMap::new(),
            docker_entrypoint: Vec::new(),
            docker_start_cmd: Vec::new(),
            template_id: None,
            min_vcpu_per_gpu: DEFAULT_MIN_VCPU_PER_GPU,
            min_ram_per_gpu: DEFAULT_MIN_RAM_PER_GPU,
            data_center_ids: Vec::new(),
            interruptible: false,
            allowed_cuda_versions: Vec::new(),
            support_public_ip: false,
        }
    }

    /// Check the params before sending them.
    pub fn validate(&self) -> RpctlResult<()> {
        if self.image_name.trim().is_empty() {
            return Err(RpctlError::validation("--image is required."));
        }
        match self.compute_type {
            ComputeType::Gpu if self.gpu_count == 0 => {
                Err(RpctlError::validation("--gpu-count must be at least 1."))
            }
            ComputeType::Cpu if self.cpu_flavor_ids.is_empty() => Err(RpctlError::validation(
                "CPU pods need at least one --cpu flavor.",
            )),
            _ => Ok(()),
        }
    }
}

/// Split a comma-separated port list.
pub fn parse_ports(ports: &str) -> Vec<String> {
    ports
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `KEY=VALUE` pairs.
pub fn parse_env(pairs: &[String]) -> RpctlResult<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|item| match item.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(RpctlError::validation(format!(
                "Invalid env format: '{item}'. Use KEY=VALUE."
            ))),
        })
        .collect()
}
