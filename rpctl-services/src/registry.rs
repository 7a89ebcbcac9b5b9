//! Container registry credentials.

use rpctl_api::models::{RegistryAuth, RegistryAuthParams};
use rpctl_api::RestClient;
use rpctl_retries::RpctlResult;
use std::sync::Arc;
use tracing::info;

/// Registry credential operations on top of the REST client.
#[derive(Debug, Clone)]
pub struct RegistryService {
    client: Arc<RestClient>,
}

impl RegistryService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List stored credentials.
    pub async fn list(&self) -> RpctlResult<Vec<RegistryAuth>> {
        self.client.list_registry_auths().await
    }

    /// Fetch one credential.
    pub async fn get(&self, auth_id: &str) -> RpctlResult<RegistryAuth> {
        self.client.get_registry_auth(auth_id).await
    }

    /// Store credentials.
    pub async fn create(&self, params: &RegistryAuthParams) -> RpctlResult<RegistryAuth> {
        let auth = self.client.create_registry_auth(params).await?;
        info!(auth_id = %auth.id, name = %auth.name, "Stored registry credentials");
        Ok(auth)
    }

    /// Delete stored credentials.
    pub async fn delete(&self, auth_id: &str) -> RpctlResult<()> {
        self.client.delete_registry_auth(auth_id).await?;
        info!(auth_id, "Deleted registry credentials");
        Ok(())
    }
}
