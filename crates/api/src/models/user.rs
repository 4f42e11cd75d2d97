//! User domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use techshop_core::{Email, UserId};

/// A registered account.
///
/// The password hash never leaves the repository layer, so this type is
/// safe to serialize into any response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique across the store).
    pub email: Email,
    /// Whether this account may use catalog and order-management mutations.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
