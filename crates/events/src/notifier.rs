//! The notifier: entry point used by request handlers.
//!
//! For every event the notifier resolves the audience, persists one
//! notification per recipient, and, when VAPID credentials are available,
//! hands each stamped message to the [`PushDispatcher`]. Only persistence is
//! awaited; push delivery happens on the dispatcher's workers.

use std::sync::Arc;

use xsuportal_core::message::NotificationMessage;
use xsuportal_db::models::contest::{BenchmarkJob, Clarification};
use xsuportal_db::models::contestant::Recipient;
use xsuportal_db::models::notification::Notification;

use crate::audience::{AudienceResolver, AudienceScope};
use crate::cache::AudienceCache;
use crate::config::PushConfig;
use crate::delivery::{DispatcherHandle, PushDelivery, PushDispatcher, PushJob, PushTransport};
use crate::error::NotifyError;
use crate::persistence::NotificationPersistence;
use crate::store::NotifierStore;
use crate::vapid::{VapidCredentials, VapidKeySource};

/// Fans contest events out to contestants.
pub struct Notifier {
    resolver: AudienceResolver,
    persistence: NotificationPersistence,
    cache: Arc<AudienceCache>,
    keys: Arc<VapidKeySource>,
    dispatcher: PushDispatcher,
}

impl Notifier {
    /// Assemble a notifier from already constructed parts.
    ///
    /// `cache` should be the same instance the dispatcher's [`PushDelivery`]
    /// uses, so that [`reset`](Self::reset) clears subscriptions too.
    pub fn new(
        store: Arc<dyn NotifierStore>,
        cache: Arc<AudienceCache>,
        keys: Arc<VapidKeySource>,
        dispatcher: PushDispatcher,
    ) -> Self {
        Self {
            resolver: AudienceResolver::new(Arc::clone(&store), Arc::clone(&cache)),
            persistence: NotificationPersistence::new(store),
            cache,
            keys,
            dispatcher,
        }
    }

    /// Build the whole engine from configuration: cache, lazy key source,
    /// and a logged dispatcher pool.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        config: &PushConfig,
        store: Arc<dyn NotifierStore>,
        transport: Arc<dyn PushTransport>,
    ) -> (Self, DispatcherHandle) {
        let keys = VapidKeySource::new(&config.vapid_private_key_path, config.subject_claim());
        Self::start_with_keys(config, store, transport, keys)
    }

    /// Like [`start`](Self::start) with a caller-provided key source, for
    /// example one preloaded by the boot-time key check.
    pub fn start_with_keys(
        config: &PushConfig,
        store: Arc<dyn NotifierStore>,
        transport: Arc<dyn PushTransport>,
        keys: VapidKeySource,
    ) -> (Self, DispatcherHandle) {
        let cache = Arc::new(AudienceCache::with_enabled(config.cache_enabled));
        let delivery = PushDelivery::new(Arc::clone(&store), Arc::clone(&cache), transport);
        let (dispatcher, handle) = PushDispatcher::start_logged(config, delivery);
        let notifier = Self::new(store, cache, Arc::new(keys), dispatcher);
        (notifier, handle)
    }

    /// Notify the audience of an answered clarification.
    ///
    /// `owned` is computed per recipient: true only for members of the team
    /// that filed the clarification.
    pub async fn notify_clarification_answered(
        &self,
        clarification: &Clarification,
        updated: bool,
    ) -> Result<Vec<Notification>, NotifyError> {
        let scope = AudienceScope::for_clarification(clarification);
        let recipients = self.resolver.resolve(scope).await?;

        self.fan_out(&recipients, |recipient| {
            NotificationMessage::clarification(
                clarification.id,
                recipient.team_id == clarification.team_id,
                updated,
            )
        })
        .await
    }

    /// Notify a team that one of its benchmark jobs finished.
    pub async fn notify_benchmark_job_finished(
        &self,
        job: &BenchmarkJob,
    ) -> Result<Vec<Notification>, NotifyError> {
        let scope = AudienceScope::for_benchmark_job(job);
        let recipients = self.resolver.resolve(scope).await?;

        self.fan_out(&recipients, |_| NotificationMessage::benchmark_job(job.id))
            .await
    }

    /// Send a test notification to a single contestant.
    pub async fn notify_test(&self, contestant_id: &str) -> Result<Notification, NotifyError> {
        let credentials = self.keys.credentials().await;
        self.deliver(NotificationMessage::test(), contestant_id, credentials.as_ref())
            .await
    }

    /// Clear the audience and subscription caches.
    pub async fn reset(&self) {
        self.cache.reset().await;
    }

    /// The VAPID application server key for browsers, if a key is available.
    pub async fn vapid_public_key(&self) -> Option<String> {
        self.keys
            .credentials()
            .await
            .map(|c| c.public_key_base64url().to_string())
    }

    async fn fan_out<F>(
        &self,
        recipients: &[Recipient],
        build: F,
    ) -> Result<Vec<Notification>, NotifyError>
    where
        F: Fn(&Recipient) -> NotificationMessage,
    {
        let credentials = self.keys.credentials().await;
        if credentials.is_none() {
            tracing::debug!(
                recipients = recipients.len(),
                "No VAPID key, notifications will be stored without push"
            );
        }

        let mut stored = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let row = self
                .deliver(build(recipient), &recipient.id, credentials.as_ref())
                .await?;
            stored.push(row);
        }
        Ok(stored)
    }

    /// Persist `message` for one contestant and queue its push.
    async fn deliver(
        &self,
        message: NotificationMessage,
        contestant_id: &str,
        credentials: Option<&Arc<VapidCredentials>>,
    ) -> Result<Notification, NotifyError> {
        let row = self.persistence.persist(&message, contestant_id).await?;

        if let Some(credentials) = credentials {
            self.dispatcher.submit(PushJob {
                contestant_id: contestant_id.to_string(),
                message: message.stamped(row.id, row.created_at),
                credentials: Arc::clone(credentials),
            });
        }

        Ok(row)
    }
}
