//! Template types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pod or serverless template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    /// Template ID.
    pub id: String,
    /// Template name.
    pub name: String,
    /// Container image.
    pub image_name: String,
    /// Container disk in GB.
    pub container_disk_in_gb: u32,
    /// Volume in GB.
    pub volume_in_gb: u32,
    /// Volume mount path.
    pub volume_mount_path: String,
    /// Exposed ports.
    pub ports: Vec<String>,
    /// Serverless template.
    pub is_serverless: bool,
    /// Public template.
    pub is_public: bool,
    /// Environment variables.
    pub env: BTreeMap<String, String>,
    /// Category, e.g. `NVIDIA`.
    pub category: String,
    /// Readme in markdown.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub readme: String,
}

/// Request body for creating or updating a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParams {
    /// Template name.
    pub name: String,
    /// Container image.
    pub image_name: String,
    /// Container disk in GB.
    pub container_disk_in_gb: u32,
    /// Volume in GB.
    pub volume_in_gb: u32,
    /// Volume mount path.
    pub volume_mount_path: String,
    /// Exposed ports.
    pub ports: Vec<String>,
    /// Environment variables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub env: BTreeMap<String, String>,
    /// Serverless template.
    pub is_serverless: bool,
    /// Registry credentials for private images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_registry_auth_id: Option<String>,
}

impl TemplateParams {
    /// Params with pod sizing defaults.
    pub fn new(name: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_name: image_name.into(),
            container_disk_in_gb: super::pod::DEFAULT_CONTAINER_DISK_GB,
            volume_in_gb: super::pod::DEFAULT_VOLUME_DISK_GB,
            volume_mount_path: super::pod::DEFAULT_VOLUME_MOUNT_PATH.to_string(),
            ports: super::pod::parse_ports(super::pod::DEFAULT_PORTS),
            env: BTreeMap::new(),
            is_serverless: false,
            container_registry_auth_id: None,
        }
    }
}
