//! Network volume management.

use rpctl_api::models::{Volume, VolumeCreateParams, VolumeUpdateParams};
use rpctl_api::RestClient;
use rpctl_retries::{RpctlError, RpctlResult};
use std::sync::Arc;
use tracing::info;

/// Network volume operations on top of the REST client.
#[derive(Debug, Clone)]
pub struct VolumeService {
    client: Arc<RestClient>,
}

impl VolumeService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List network volumes.
    pub async fn list(&self) -> RpctlResult<Vec<Volume>> {
        self.client.list_volumes().await
    }

    /// Fetch one network volume.
    pub async fn get(&self, volume_id: &str) -> RpctlResult<Volume> {
        self.client.get_volume(volume_id).await
    }

    /// Create a network volume.
    pub async fn create(&self, params: &VolumeCreateParams) -> RpctlResult<Volume> {
        if params.size == 0 {
            return Err(RpctlError::validation("--size must be at least 1 GB."));
        }
        let volume = self.client.create_volume(params).await?;
        info!(volume_id = %volume.id, size = volume.size, "Created volume");
        Ok(volume)
    }

    /// Rename or grow a network volume.
    ///
    /// Shrinking is rejected before any call is made.
    pub async fn update(&self, volume_id: &str, params: &VolumeUpdateParams) -> RpctlResult<Volume> {
        if let Some(size) = params.size {
            let current = self.client.get_volume(volume_id).await?;
            if size < current.size {
                return Err(RpctlError::validation(format!(
                    "Volume size can only grow ({} GB -> {size} GB).",
                    current.size
                )));
            }
        }
        self.client.update_volume(volume_id, params).await
    }

    /// Delete a network volume.
    pub async fn delete(&self, volume_id: &str) -> RpctlResult<()> {
        self.client.delete_volume(volume_id).await?;
        info!(volume_id, "Deleted volume");
        Ok(())
    }
}
