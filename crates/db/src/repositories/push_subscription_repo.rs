//! Repository for the `push_subscriptions` table.

use sqlx::PgPool;

use crate::models::push_subscription::PushSubscription;

/// Column list for `push_subscriptions` queries.
const COLUMNS: &str = "id, contestant_id, endpoint, p256dh, auth, created_at, updated_at";

/// Read access to contestants' push subscriptions.
pub struct PushSubscriptionRepo;

impl PushSubscriptionRepo {
    /// All subscriptions registered by a contestant. Empty if none.
    pub async fn list_for_contestant(
        pool: &PgPool,
        contestant_id: &str,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM push_subscriptions WHERE contestant_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(contestant_id)
            .fetch_all(pool)
            .await
    }
}
