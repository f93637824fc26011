//! Storage seam for the notifier.
//!
//! [`NotifierStore`] is everything the engine needs from the relational
//! store. [`PgNotifierStore`] is the production implementation on top of the
//! `xsuportal-db` repositories.

use async_trait::async_trait;
use xsuportal_core::types::DbId;
use xsuportal_db::models::contestant::Recipient;
use xsuportal_db::models::notification::Notification;
use xsuportal_db::models::push_subscription::PushSubscription;
use xsuportal_db::repositories::{ContestantRepo, NotificationRepo, PushSubscriptionRepo};
use xsuportal_db::DbPool;

/// Reads and writes performed by the notifier.
#[async_trait]
pub trait NotifierStore: Send + Sync {
    /// Every contestant that belongs to some team.
    async fn contestants_with_team(&self) -> Result<Vec<Recipient>, sqlx::Error>;

    /// Every contestant on `team_id`.
    async fn contestants_in_team(&self, team_id: DbId) -> Result<Vec<Recipient>, sqlx::Error>;

    /// Push subscriptions registered by a contestant.
    async fn push_subscriptions(
        &self,
        contestant_id: &str,
    ) -> Result<Vec<PushSubscription>, sqlx::Error>;

    /// Insert a notification row and return its generated ID.
    async fn insert_notification(
        &self,
        contestant_id: &str,
        encoded_message: &str,
    ) -> Result<DbId, sqlx::Error>;

    /// Read back a notification row.
    async fn find_notification(&self, id: DbId) -> Result<Option<Notification>, sqlx::Error>;
}

/// [`NotifierStore`] backed by Postgres.
#[derive(Clone)]
pub struct PgNotifierStore {
    pool: DbPool,
}

impl PgNotifierStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotifierStore for PgNotifierStore {
    async fn contestants_with_team(&self) -> Result<Vec<Recipient>, sqlx::Error> {
        ContestantRepo::list_with_team(&self.pool).await
    }

    async fn contestants_in_team(&self, team_id: DbId) -> Result<Vec<Recipient>, sqlx::Error> {
        ContestantRepo::list_for_team(&self.pool, team_id).await
    }

    async fn push_subscriptions(
        &self,
        contestant_id: &str,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        PushSubscriptionRepo::list_for_contestant(&self.pool, contestant_id).await
    }

    async fn insert_notification(
        &self,
        contestant_id: &str,
        encoded_message: &str,
    ) -> Result<DbId, sqlx::Error> {
        NotificationRepo::create(&self.pool, contestant_id, encoded_message).await
    }

    async fn find_notification(&self, id: DbId) -> Result<Option<Notification>, sqlx::Error> {
        NotificationRepo::find_by_id(&self.pool, id).await
    }
}
