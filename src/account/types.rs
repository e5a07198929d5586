//! Account records and their public projection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access role attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Savings-account holder; may move money on their own account.
    Client,
    /// Back-office role, reserved for the admin surface.
    Admin,
}

/// A stored account. Mutated only through [`AccountStore`] operations,
/// never read-modify-write by callers.
///
/// [`AccountStore`]: crate::account::store::AccountStore
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub device_id: String,
    pub is_verified: bool,
    pub role: Role,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(name: String, email: String, password_hash: String, device_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            device_id,
            is_verified: false,
            role: Role::Client,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    /// The wire-safe projection (no password hash).
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            device_id: self.device_id.clone(),
            balance: self.balance,
            is_verified: self.is_verified,
            role: self.role,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Public view of an account, returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub device_id: String,
    pub balance: Decimal,
    pub is_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}
