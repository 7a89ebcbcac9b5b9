//! GPU, CPU and datacenter capacity types.
//!
//! These mirror the GraphQL `gpuTypes`, `cpuTypes` and
//! `myself.datacenters` shapes.

use serde::{Deserialize, Serialize};

// ============================================================================
// GPU Types
// ============================================================================

/// A GPU type with pricing and stock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpuType {
    /// GPU type ID, e.g. `NVIDIA A40`.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Manufacturer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// VRAM in GB.
    pub memory_in_gb: u32,
    /// CUDA core count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuda_cores: Option<u32>,
    /// Offered in the secure cloud.
    pub secure_cloud: bool,
    /// Offered in the community cloud.
    pub community_cloud: bool,
    /// Secure cloud price per hour.
    pub secure_price: Option<f64>,
    /// Community cloud price per hour.
    pub community_price: Option<f64>,
    /// Secure cloud spot price per hour.
    pub secure_spot_price: Option<f64>,
    /// Community cloud spot price per hour.
    pub community_spot_price: Option<f64>,
    /// Maximum GPUs per pod.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_gpu_count: Option<u32>,
    /// Lowest current price and stock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_price: Option<GpuStock>,
}

/// Lowest-price block with stock information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpuStock {
    /// Minimum spot bid.
    pub minimum_bid_price: Option<f64>,
    /// On-demand price.
    pub uninterruptable_price: Option<f64>,
    /// `High`, `Medium`, `Low` or absent when none are free.
    pub stock_status: Option<String>,
    /// GPUs rented.
    pub rented_count: Option<u32>,
    /// GPUs in the fleet.
    pub total_count: Option<u32>,
    /// Share rented.
    pub rental_percentage: Option<f64>,
    /// Largest unreserved count.
    pub max_unreserved_gpu_count: Option<u32>,
    /// Counts that can be rented right now.
    #[serde(deserialize_with = "null_as_default")]
    pub available_gpu_counts: Vec<u32>,
    /// Country of the cheapest offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl GpuType {
    /// Hourly price in the given cloud.
    pub fn price(&self, secure: bool) -> Option<f64> {
        if secure {
            self.secure_price
        } else {
            self.community_price
        }
    }

    /// Stock status, or `None` when unknown.
    pub fn stock_status(&self) -> Option<&str> {
        self.lowest_price.as_ref()?.stock_status.as_deref()
    }

    /// Whether the platform reports stock for this type.
    pub fn is_available(&self) -> bool {
        self.stock_status()
            .is_some_and(|s| !s.eq_ignore_ascii_case("unavailable"))
    }

    /// Current on-demand price, if reported.
    pub fn on_demand_price(&self) -> Option<f64> {
        self.lowest_price.as_ref()?.uninterruptable_price
    }

    /// GPUs of this type in the fleet, if reported.
    pub fn total_count(&self) -> Option<u32> {
        self.lowest_price.as_ref()?.total_count
    }
}

// ============================================================================
// CPU Types
// ============================================================================

/// A CPU type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuType {
    /// CPU type ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Manufacturer.
    pub manufacturer: Option<String>,
    /// Core count.
    pub cores: Option<u32>,
    /// Threads per core.
    pub threads_per_core: Option<u32>,
    /// Flavor group.
    pub group_id: Option<String>,
}

// ============================================================================
// Datacenters
// ============================================================================

/// A datacenter and its GPU availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datacenter {
    /// Datacenter ID, e.g. `EU-RO-1`.
    pub id: String,
    /// Name.
    pub name: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Region.
    pub region: Option<String>,
    /// Listed publicly.
    pub listed: bool,
    /// Network volumes supported.
    pub storage_support: bool,
    /// Per-GPU availability.
    #[serde(deserialize_with = "null_as_default")]
    pub gpu_availability: Vec<DatacenterGpu>,
}

/// GPU availability within one datacenter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatacenterGpu {
    /// GPU type ID.
    pub gpu_type_id: String,
    /// Display name.
    pub gpu_type_display_name: String,
    /// Available now.
    pub available: bool,
    /// Stock status.
    pub stock_status: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
