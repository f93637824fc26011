//! Repository for the `notifications` table.

use sqlx::PgPool;
use xsuportal_core::types::DbId;

use crate::models::notification::Notification;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, contestant_id, encoded_message, read, created_at, updated_at";

/// Insert and read-back for notifications. Read-state updates belong to the
/// portal, not to the notifier.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification for a contestant, returning the generated ID.
    ///
    /// `read`, `created_at` and `updated_at` take their column defaults.
    pub async fn create(
        pool: &PgPool,
        contestant_id: &str,
        encoded_message: &str,
    ) -> Result<DbId, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO notifications (contestant_id, encoded_message) \
             VALUES ($1, $2) \
             RETURNING id",
        )
        .bind(contestant_id)
        .bind(encoded_message)
        .fetch_one(pool)
        .await?;

        tracing::debug!(notification_id = id, contestant_id, "Notification row inserted");
        Ok(id)
    }

    /// Find a notification by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
