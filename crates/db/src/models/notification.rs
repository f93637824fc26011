//! Notification entity model.

use serde::Serialize;
use sqlx::FromRow;
use xsuportal_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub contestant_id: String,
    /// Base64 of the unstamped message.
    pub encoded_message: String,
    pub read: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
