//! GPU, CPU and datacenter capacity queries.

use rpctl_api::models::{CpuType, Datacenter, GpuType};
use rpctl_api::GraphQLClient;
use rpctl_retries::{RpctlError, RpctlResult};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

/// Which cloud to consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloudFilter {
    /// Both clouds.
    #[default]
    All,
    /// Secure cloud only.
    Secure,
    /// Community cloud only.
    Community,
}

impl FromStr for CloudFilter {
    type Err = RpctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "secure" => Ok(Self::Secure),
            "community" => Ok(Self::Community),
            other => Err(RpctlError::validation(format!(
                "Invalid cloud type '{other}'. Use all, secure or community."
            ))),
        }
    }
}

/// GPU list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GpuSort {
    /// Cheapest on-demand price first; unpriced last.
    #[default]
    Price,
    /// Most VRAM first.
    Vram,
    /// Display name, case-insensitive.
    Name,
    /// Largest fleet first.
    Availability,
}

impl FromStr for GpuSort {
    type Err = RpctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "vram" => Ok(Self::Vram),
            "name" => Ok(Self::Name),
            "availability" => Ok(Self::Availability),
            other => Err(RpctlError::validation(format!(
                "Invalid sort key '{other}'. Use price, vram, name or availability."
            ))),
        }
    }
}

/// Filters for [`CapacityService::list_gpu_types`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuQuery {
    /// Cloud filter.
    pub cloud: CloudFilter,
    /// Minimum VRAM in GB.
    pub min_vram: Option<u32>,
    /// Drop types with no stock.
    pub available_only: bool,
    /// Ordering.
    pub sort: GpuSort,
}

/// Capacity queries on top of the GraphQL client.
#[derive(Debug, Clone)]
pub struct CapacityService {
    client: Arc<GraphQLClient>,
}

impl CapacityService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<GraphQLClient>) -> Self {
        Self { client }
    }

    /// GPU types matching `query`, sorted.
    pub async fn list_gpu_types(&self, query: &GpuQuery) -> RpctlResult<Vec<GpuType>> {
        let gpus = self.client.gpu_types().await?;
        Ok(filter_gpus(gpus, query))
    }

    /// Availability of one GPU type in one cloud.
    pub async fn check_gpu(&self, gpu_type: &str, gpu_count: u32, secure: bool) -> RpctlResult<GpuType> {
        self.client
            .gpu_availability(gpu_type, gpu_count, Some(secure))
            .await?
            .ok_or_else(|| RpctlError::not_found(format!("GPU type '{gpu_type}' not found.")))
    }

    /// Datacenters sorted by ID, optionally only those offering a GPU
    /// whose ID or name contains `gpu_filter`.
    pub async fn list_regions(&self, gpu_filter: Option<&str>) -> RpctlResult<Vec<Datacenter>> {
        let mut datacenters = self.client.datacenters().await?;
        if let Some(filter) = gpu_filter {
            let needle = filter.to_lowercase();
            datacenters.retain(|dc| {
                dc.gpu_availability.iter().any(|g| {
                    g.gpu_type_id.to_lowercase().contains(&needle)
                        || g.gpu_type_display_name.to_lowercase().contains(&needle)
                })
            });
        }
        datacenters.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(datacenters)
    }

    /// CPU types.
    pub async fn list_cpu_types(&self) -> RpctlResult<Vec<CpuType>> {
        self.client.cpu_types().await
    }
}

fn filter_gpus(gpus: Vec<GpuType>, query: &GpuQuery) -> Vec<GpuType> {
    let mut gpus: Vec<GpuType> = gpus
        .into_iter()
        .filter(|g| match query.cloud {
            CloudFilter::All => true,
            CloudFilter::Secure => g.secure_cloud,
            CloudFilter::Community => g.community_cloud,
        })
        .filter(|g| query.min_vram.map_or(true, |min| g.memory_in_gb >= min))
        .filter(|g| !query.available_only || g.is_available())
        .collect();

    match query.sort {
        GpuSort::Price => gpus.sort_by(|a, b| {
            let pa = a.on_demand_price().unwrap_or(f64::INFINITY);
            let pb = b.on_demand_price().unwrap_or(f64::INFINITY);
            pa.partial_cmp(&pb).unwrap_or(Ordering::Equal)
        }),
        GpuSort::Vram => gpus.sort_by(|a, b| b.memory_in_gb.cmp(&a.memory_in_gb)),
        GpuSort::Name => gpus.sort_by_key(|g| g.display_name.to_lowercase()),
        GpuSort::Availability => {
            gpus.sort_by(|a, b| b.total_count().unwrap_or(0).cmp(&a.total_count().unwrap_or(0)))
        }
    }
    gpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpctl_retries::RetryPolicy;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gpus() -> Vec<GpuType> {
        serde_json::from_value(json!([
            {
                "id": "NVIDIA A40", "displayName": "A40", "memoryInGb": 48,
                "secureCloud": true, "communityCloud": false,
                "lowestPrice": {"uninterruptablePrice": 0.39, "stockStatus": "High", "totalCount": 40}
            },
            {
                "id": "NVIDIA GeForce RTX 4090", "displayName": "RTX 4090", "memoryInGb": 24,
                "secureCloud": true, "communityCloud": true,
                "lowestPrice": {"uninterruptablePrice": 0.34, "stockStatus": "Low", "totalCount": 300}
            },
            {
                "id": "NVIDIA H100 80GB HBM3", "displayName": "H100 SXM", "memoryInGb": 80,
                "secureCloud": false, "communityCloud": true,
                "lowestPrice": {"stockStatus": null}
            }
        ]))
        .unwrap()
    }

    fn ids(gpus: &[GpuType]) -> Vec<&str> {
        gpus.iter().map(|g| g.display_name.as_str()).collect()
    }

    #[rstest]
    #[case(GpuSort::Price, vec!["RTX 4090", "A40", "H100 SXM"])]
    #[case(GpuSort::Vram, vec!["H100 SXM", "A40", "RTX 4090"])]
    #[case(GpuSort::Name, vec!["A40", "H100 SXM", "RTX 4090"])]
    #[case(GpuSort::Availability, vec!["RTX 4090", "A40", "H100 SXM"])]
    fn test_sort_orders(#[case] sort: GpuSort, #[case] expected: Vec<&str>) {
        let query = GpuQuery {
            sort,
            ..Default::default()
        };
        assert_eq!(ids(&filter_gpus(gpus(), &query)), expected);
    }

    #[test]
    fn test_filters_combine() {
        let query = GpuQuery {
            cloud: CloudFilter::Secure,
            min_vram: Some(32),
            ..Default::default()
        };
        assert_eq!(ids(&filter_gpus(gpus(), &query)), vec!["A40"]);

        let query = GpuQuery {
            available_only: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter_gpus(gpus(), &query)), vec!["RTX 4090", "A40"]);
    }

    #[rstest]
    #[case("all", CloudFilter::All)]
    #[case("Secure", CloudFilter::Secure)]
    #[case("COMMUNITY", CloudFilter::Community)]
    fn test_cloud_filter_parse(#[case] input: &str, #[case] expected: CloudFilter) {
        assert_eq!(input.parse::<CloudFilter>().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_check_unknown_gpu_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"gpuTypes": []}
            })))
            .mount(&server)
            .await;

        let client = GraphQLClient::new("k")
            .unwrap()
            .with_url(server.uri())
            .with_policy(RetryPolicy::no_retry());
        let err = CapacityService::new(Arc::new(client))
            .check_gpu("NVIDIA B999", 1, true)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "GPU type 'NVIDIA B999' not found.");
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn test_regions_filtered_and_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"myself": {"datacenters": [
                    {"id": "US-TX-3", "gpuAvailability": [{"gpuTypeId": "NVIDIA A40", "gpuTypeDisplayName": "A40"}]},
                    {"id": "EU-RO-1", "gpuAvailability": [{"gpuTypeId": "NVIDIA A40", "gpuTypeDisplayName": "A40"}]},
                    {"id": "CA-MTL-1", "gpuAvailability": [{"gpuTypeId": "NVIDIA L4", "gpuTypeDisplayName": "L4"}]}
                ]}}
            })))
            .mount(&server)
            .await;

        let client = GraphQLClient::new("k")
            .unwrap()
            .with_url(server.uri())
            .with_policy(RetryPolicy::no_retry());
        let service = CapacityService::new(Arc::new(client));

        let regions = service.list_regions(Some("a40")).await.unwrap();
        let ids: Vec<_> = regions.iter().map(|dc| dc.id.as_str()).collect();
        assert_eq!(ids, vec!["EU-RO-1", "US-TX-3"]);
    }
}
