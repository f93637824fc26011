//! Browser push subscription model.

use serde::Serialize;
use sqlx::FromRow;
use xsuportal_core::types::{DbId, Timestamp};

/// A row from the `push_subscriptions` table.
///
/// A contestant may hold several of these, one per browser or device.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushSubscription {
    pub id: DbId,
    pub contestant_id: String,
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Browser's P-256 ECDH public key (base64url).
    pub p256dh: String,
    /// Shared auth secret (base64url).
    pub auth: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
