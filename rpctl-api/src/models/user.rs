//! Account types.

use serde::{Deserialize, Serialize};

/// The authenticated account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// User ID.
    pub id: String,
    /// Account email.
    pub email: Option<String>,
    /// Credit balance in USD.
    pub client_balance: f64,
    /// Current spend per hour.
    pub current_spend_per_hr: f64,
    /// Spend limit.
    pub spend_limit: Option<f64>,
    /// Authorized SSH public keys, newline separated.
    pub pubkey: Option<String>,
}
