//! Container registry credential types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored credentials for a private container registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryAuth {
    /// Credential ID.
    pub id: String,
    /// Credential name.
    pub name: String,
}

/// Request body for storing registry credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryAuthParams {
    /// Credential name.
    pub name: String,
    /// Registry user name.
    pub username: String,
    /// Registry password or token.
    pub password: String,
}

impl fmt::Debug for RegistryAuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuthParams")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
