//! Network volume types.

use serde::{Deserialize, Serialize};

/// A network volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    /// Volume ID.
    pub id: String,
    /// Volume name.
    pub name: String,
    /// Size in GB.
    #[serde(alias = "sizeInGb")]
    pub size: u32,
    /// Datacenter the volume lives in.
    pub data_center_id: String,
}

/// Request body for creating a network volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeCreateParams {
    /// Volume name.
    pub name: String,
    /// Size in GB.
    pub size: u32,
    /// Datacenter to create it in.
    pub data_center_id: String,
}

/// Partial update for a network volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeUpdateParams {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New size in GB. Volumes can only grow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}
