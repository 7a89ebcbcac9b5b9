//! Account information.

use rpctl_api::models::User;
use rpctl_api::GraphQLClient;
use rpctl_retries::{RpctlError, RpctlResult};
use std::sync::Arc;

/// Account operations on top of the GraphQL client.
#[derive(Debug, Clone)]
pub struct UserService {
    client: Arc<GraphQLClient>,
}

impl UserService {
    /// Create a service sharing `client`.
    pub fn new(client: Arc<GraphQLClient>) -> Self {
        Self { client }
    }

    /// The authenticated account.
    pub async fn info(&self) -> RpctlResult<User> {
        self.client.myself().await
    }

    /// Replace the account's SSH public keys.
    pub async fn set_ssh_key(&self, pubkey: &str) -> RpctlResult<User> {
        let pubkey = pubkey.trim();
        if !pubkey.starts_with("ssh-") && !pubkey.starts_with("ecdsa-") {
            return Err(RpctlError::validation(
                "Not an SSH public key (expected ssh-ed25519, ssh-rsa or ecdsa-...).",
            ));
        }
        self.client.update_user_settings(pubkey).await
    }
}
