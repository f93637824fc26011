//! Shared test doubles for the notifier integration tests.
//!
//! - [`MemoryStore`]: in-memory [`NotifierStore`] with query-count probes and
//!   injectable failures.
//! - [`ScriptedTransport`]: [`PushTransport`] that records every send and
//!   answers with a per-endpoint status code.
//! - [`Harness`]: a wired-up notifier whose delivery reports can be drained.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use xsuportal_core::types::DbId;
use xsuportal_db::models::contestant::{Contestant, Recipient};
use xsuportal_db::models::notification::Notification;
use xsuportal_db::models::push_subscription::PushSubscription;
use xsuportal_events::delivery::PushSendError;
use xsuportal_events::{
    AudienceCache, DeliveryReport, DispatcherHandle, Notifier, NotifierStore, PushConfig,
    PushDelivery, PushDispatcher, PushTransport, VapidCredentials, VapidKeySource,
};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    contestants: Mutex<Vec<Contestant>>,
    subscriptions: Mutex<Vec<PushSubscription>>,
    notifications: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
    audience_queries: AtomicUsize,
    subscription_queries: AtomicUsize,
    fail_audience: AtomicBool,
    fail_insert_for: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn with_contestants(contestants: &[(&str, Option<DbId>)]) -> Self {
        let store = Self::default();
        *store.contestants.lock().unwrap() = contestants
            .iter()
            .map(|(id, team_id)| Contestant {
                id: id.to_string(),
                team_id: *team_id,
            })
            .collect();
        store
    }

    pub fn add_subscription(&self, contestant_id: &str, endpoint: &str) {
        let now = chrono::Utc::now();
        let mut subs = self.subscriptions.lock().unwrap();
        let id = subs.len() as DbId + 1;
        subs.push(PushSubscription {
            id,
            contestant_id: contestant_id.to_string(),
            endpoint: endpoint.to_string(),
            p256dh: "p256dh".into(),
            auth: "auth".into(),
            created_at: now,
            updated_at: now,
        });
    }

    pub fn fail_audience(&self, fail: bool) {
        self.fail_audience.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert_for(&self, contestant_id: &str) {
        *self.fail_insert_for.lock().unwrap() = Some(contestant_id.to_string());
    }

    pub fn audience_queries(&self) -> usize {
        self.audience_queries.load(Ordering::SeqCst)
    }

    pub fn subscription_queries(&self) -> usize {
        self.subscription_queries.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn rows_for(&self, contestant_id: &str) -> usize {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.contestant_id == contestant_id)
            .count()
    }

    fn audience_where(
        &self,
        keep: impl Fn(&Contestant) -> bool,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        self.audience_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_audience.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .contestants
            .lock()
            .unwrap()
            .iter()
            .filter(|c| keep(c))
            .cloned()
            .filter_map(Contestant::into_recipient)
            .collect())
    }
}

#[async_trait]
impl NotifierStore for MemoryStore {
    async fn contestants_with_team(&self) -> Result<Vec<Recipient>, sqlx::Error> {
        self.audience_where(|c| c.team_id.is_some())
    }

    async fn contestants_in_team(&self, team_id: DbId) -> Result<Vec<Recipient>, sqlx::Error> {
        self.audience_where(|c| c.team_id == Some(team_id))
    }

    async fn push_subscriptions(
        &self,
        contestant_id: &str,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        self.subscription_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.contestant_id == contestant_id)
            .cloned()
            .collect())
    }

    async fn insert_notification(
        &self,
        contestant_id: &str,
        encoded_message: &str,
    ) -> Result<DbId, sqlx::Error> {
        if self.fail_insert_for.lock().unwrap().as_deref() == Some(contestant_id) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = chrono::Utc::now();
        self.notifications.lock().unwrap().push(Notification {
            id,
            contestant_id: contestant_id.to_string(),
            encoded_message: encoded_message.to_string(),
            read: false,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn find_notification(&self, id: DbId) -> Result<Option<Notification>, sqlx::Error> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// A recorded push: endpoint and raw payload bytes.
#[derive(Debug, Clone)]
pub struct SentPush {
    pub endpoint: String,
    pub payload: Vec<u8>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    statuses: Mutex<HashMap<String, u16>>,
    failing: Mutex<Vec<String>>,
    panicking: Mutex<Vec<String>>,
    sent: Mutex<Vec<SentPush>>,
}

impl ScriptedTransport {
    /// Answer `status` for `endpoint` (default is 201).
    pub fn respond(&self, endpoint: &str, status: u16) {
        self.statuses
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), status);
    }

    /// Fail sends to `endpoint` before any status is received.
    pub fn fail(&self, endpoint: &str) {
        self.failing.lock().unwrap().push(endpoint.to_string());
    }

    /// Panic inside the send to `endpoint`, after recording it.
    pub fn panic_on(&self, endpoint: &str) {
        self.panicking.lock().unwrap().push(endpoint.to_string());
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn send(
        &self,
        _credentials: &VapidCredentials,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<u16, PushSendError> {
        self.sent.lock().unwrap().push(SentPush {
            endpoint: subscription.endpoint.clone(),
            payload: payload.to_vec(),
        });
        let panics = self.panicking.lock().unwrap().contains(&subscription.endpoint);
        if panics {
            panic!("transport blew up for {}", subscription.endpoint);
        }
        if self.failing.lock().unwrap().contains(&subscription.endpoint) {
            return Err(PushSendError::Message(web_push::WebPushError::Unspecified));
        }
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(&subscription.endpoint)
            .copied()
            .unwrap_or(201))
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub fn test_credentials() -> VapidCredentials {
    let secret = p256::SecretKey::from_slice(&[0x2a; 32]).expect("valid scalar");
    VapidCredentials::from_secret_key(&secret, "mailto:xsuportal@example.com")
}

/// A key source holding credentials.
pub fn keys_present() -> VapidKeySource {
    VapidKeySource::preloaded("unused.pem", test_credentials())
}

/// A key source pointing at a file that does not exist.
pub fn keys_absent() -> VapidKeySource {
    VapidKeySource::new("/nonexistent/vapid_private.pem", "mailto:xsuportal@example.com")
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Notifier,
    handle: DispatcherHandle,
    reports: mpsc::UnboundedReceiver<DeliveryReport>,
}

/// Everything observable once the dispatcher has drained.
pub struct Drained {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub reports: Vec<DeliveryReport>,
}

impl Harness {
    pub fn new(store: MemoryStore, keys: VapidKeySource) -> Self {
        let config = PushConfig {
            workers: 4,
            ..PushConfig::default()
        };
        Self::with_config(store, keys, &config)
    }

    pub fn with_config(store: MemoryStore, keys: VapidKeySource, config: &PushConfig) -> Self {
        let store = Arc::new(store);
        let transport = Arc::new(ScriptedTransport::default());
        let cache = Arc::new(AudienceCache::with_enabled(config.cache_enabled));
        let delivery = PushDelivery::new(store.clone(), Arc::clone(&cache), transport.clone());
        let (reports_tx, reports) = mpsc::unbounded_channel();
        let (dispatcher, handle) = PushDispatcher::start(config, delivery, reports_tx);
        let notifier = Notifier::new(store.clone(), cache, Arc::new(keys), dispatcher);

        Self {
            store,
            transport,
            notifier,
            handle,
            reports,
        }
    }

    /// Drop the notifier, wait for in-flight deliveries, collect reports.
    pub async fn drain(self) -> Drained {
        let Self {
            store,
            transport,
            notifier,
            handle,
            mut reports,
        } = self;
        drop(notifier);
        handle.join().await;

        let mut collected = Vec::new();
        while let Some(report) = reports.recv().await {
            collected.push(report);
        }
        Drained {
            store,
            transport,
            reports: collected,
        }
    }
}
