//! Durable notification records.
//!
//! Persistence is the durability boundary of a notification: once
//! [`NotificationPersistence::persist`] returns, the contestant will see the
//! notification in the portal whether or not push delivery succeeds.

use std::sync::Arc;

use xsuportal_core::message::NotificationMessage;
use xsuportal_db::models::notification::Notification;

use crate::error::NotifyError;
use crate::store::NotifierStore;

/// Writes one notification row per (message, recipient) pair.
pub struct NotificationPersistence {
    store: Arc<dyn NotifierStore>,
}

impl NotificationPersistence {
    pub fn new(store: Arc<dyn NotifierStore>) -> Self {
        Self { store }
    }

    /// Encode `message`, insert it for `contestant_id`, and read the row back.
    ///
    /// The read-back supplies the ID and `created_at` that get stamped into
    /// the push payload.
    pub async fn persist(
        &self,
        message: &NotificationMessage,
        contestant_id: &str,
    ) -> Result<Notification, NotifyError> {
        let encoded = message.to_base64()?;
        let id = self.store.insert_notification(contestant_id, &encoded).await?;
        let row = self
            .store
            .find_notification(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tracing::debug!(notification_id = row.id, contestant_id, "Notification persisted");
        Ok(row)
    }
}
